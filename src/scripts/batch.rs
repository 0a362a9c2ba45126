//! Windows batch driver.
//!
//! The driver is what the operator actually runs. It checks that every
//! generated artifact is present, reuses or asks for the database
//! credentials, tests the connection and then runs the DROP script, the
//! CREATE script and the loader companion, stopping at the first failure.

use super::ScriptContext;

/// Generate the batch driver script. Lines end in `\n`; the artifact writer
/// converts them to CRLF.
pub fn render_batch_driver(ctx: &ScriptContext<'_>) -> String {
    let table = &ctx.schema.name;
    let timestamp = ctx.timestamp();
    let files = ctx.files;

    let exec_dir = ctx
        .target
        .execution_dir
        .as_deref()
        .map(|dir| format!("set \"LOCAL_EXEC_PATH={dir}\""))
        .unwrap_or_else(|| "set \"LOCAL_EXEC_PATH=%~dp0\"".to_owned());

    let credentials = &files.credentials_file;
    let drop_script = &files.drop_script;
    let create_script = &files.create_script;
    let loader_script = &files.loader_script;
    let data_file = &files.data_file;

    let drop_step = sqlplus_step(
        "DROP TABLE",
        "DROP_SCRIPT_NAME",
        "The table was dropped or did not exist.",
    );
    let create_step = sqlplus_step(
        "CREATE TABLE",
        "CREATE_SCRIPT_NAME",
        "The table was created and access was granted.",
    );

    format!(
        r#"@echo off
rem Creates and loads table {table}
rem Generated: {timestamp}

SETLOCAL ENABLEDELAYEDEXPANSION

{exec_dir}
if "!LOCAL_EXEC_PATH:~-1!"=="\" set "LOCAL_EXEC_PATH=!LOCAL_EXEC_PATH:~0,-1!"

set "CREDENTIALS_FILE={credentials}"
set "DROP_SCRIPT_NAME={drop_script}"
set "CREATE_SCRIPT_NAME={create_script}"
set "LOADER_SCRIPT_NAME={loader_script}"
set "DATA_FILE_NAME={data_file}"
set "CREDENTIALS_PATH=!LOCAL_EXEC_PATH!\!CREDENTIALS_FILE!"

echo.
echo =========================================================================
echo Checking required files in: !LOCAL_EXEC_PATH!
for %%F in ("!DROP_SCRIPT_NAME!" "!CREATE_SCRIPT_NAME!" "!LOADER_SCRIPT_NAME!" "!DATA_FILE_NAME!") do (
    if not exist "!LOCAL_EXEC_PATH!\%%~F" (
        echo ERROR: Required file not found: !LOCAL_EXEC_PATH!\%%~F
        pause
        exit /b 1
    )
)
echo All required files found.

if not exist "!CREDENTIALS_PATH!" goto PROMPT_CREDENTIALS
for /f "usebackq tokens=1-3 delims=," %%a in ("!CREDENTIALS_PATH!") do (
    set "DB_USER=%%a"
    set "DB_PASS=%%b"
    set "DB_DSN=%%c"
)
echo.
echo Last environment used: !DB_USER!@!DB_DSN!
set "USE_LAST_ENV="
set /p USE_LAST_ENV="Continue with the same environment? (Y/N): "
if /i "!USE_LAST_ENV!"=="Y" goto CONNECT

:PROMPT_CREDENTIALS
echo.
echo Enter the database connection details:
set /p DB_USER="User: "
set /p DB_PASS="Password: "
set /p DB_DSN="DSN: "
>"!CREDENTIALS_PATH!" echo !DB_USER!,!DB_PASS!,!DB_DSN!
echo Credentials saved in !CREDENTIALS_FILE!.

:CONNECT
echo.
echo Connecting as !DB_USER!@!DB_DSN!
sqlplus -L -S "!DB_USER!/!DB_PASS!@!DB_DSN!" <NUL >NUL
if !ERRORLEVEL! NEQ 0 (
    echo.
    echo ERROR: Could not connect to the database. Check the credentials and the DSN.
    echo Answer N on the next run to enter new credentials.
    pause
    exit /b 1
)
echo Connection OK.
{drop_step}
{create_step}
echo.
echo =========================================================================
echo Loading !DATA_FILE_NAME! with SQL*Loader
set "DB_USER_SQL=!DB_USER!"
set "DB_PASS_SQL=!DB_PASS!"
set "DB_DSN_SQL=!DB_DSN!"
powershell.exe -NoProfile -ExecutionPolicy Bypass -File "!LOCAL_EXEC_PATH!\!LOADER_SCRIPT_NAME!" -ExecDir "!LOCAL_EXEC_PATH!"
set "STEP_EXIT=!ERRORLEVEL!"
if "!STEP_EXIT!"=="0" (
    echo Data loaded successfully.
) else if "!STEP_EXIT!"=="2" (
    echo WARNING: Data loaded with warnings. Check sqlldr.log and sqlldr.bad.
) else (
    echo ERROR: Data load failed with exit code !STEP_EXIT!. Check the output above and sqlldr.log.
    pause
    exit /b 1
)

echo.
echo =========================================================================
echo Load of table {table} finished.
pause
exit /b 0
"#
    )
}

/// Runs one `SQL*Plus` script and reports its exit code: 0 success,
/// 1 warning, anything else stops the driver.
fn sqlplus_step(label: &str, script_var: &str, success_detail: &str) -> String {
    format!(
        r#"
echo.
echo =========================================================================
echo Running the {label} script: !LOCAL_EXEC_PATH!\!{script_var}!
sqlplus -L -S "!DB_USER!/!DB_PASS!@!DB_DSN!" "@!LOCAL_EXEC_PATH!\!{script_var}!"
set "STEP_EXIT=!ERRORLEVEL!"
if "!STEP_EXIT!"=="0" (
    echo {label} script finished successfully. {success_detail}
) else if "!STEP_EXIT!"=="1" (
    echo WARNING: {label} script finished with warnings. Check the SQL*Plus output above.
) else (
    echo ERROR: {label} script failed with exit code !STEP_EXIT!. Check the SQL*Plus output above.
    pause
    exit /b 1
)"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GeneratorConfig;
    use crate::scripts::test_support::{convenio_plano, generated_at};

    fn render(config: &GeneratorConfig) -> String {
        let schema = convenio_plano();
        render_batch_driver(&ScriptContext::new(&schema, config, generated_at()))
    }

    #[test]
    fn test_checks_every_artifact() {
        let script = render(&GeneratorConfig::default());

        assert!(script.starts_with("@echo off\n"));
        assert!(script.contains("set \"DROP_SCRIPT_NAME=drop_table_script.sql\""));
        assert!(script.contains("set \"CREATE_SCRIPT_NAME=create_table_only_script.sql\""));
        assert!(script.contains("set \"LOADER_SCRIPT_NAME=execute_sqlldr.ps1\""));
        assert!(script.contains("set \"DATA_FILE_NAME=temp_data_to_load.csv\""));
        assert!(script.contains(
            "for %%F in (\"!DROP_SCRIPT_NAME!\" \"!CREATE_SCRIPT_NAME!\" \"!LOADER_SCRIPT_NAME!\" \"!DATA_FILE_NAME!\")"
        ));
        assert!(script.contains("rem Generated: 2025-03-14 09:26:53"));
    }

    #[test]
    fn test_credentials_are_reused_or_prompted() {
        let script = render(&GeneratorConfig::default());

        assert!(script.contains("set \"CREDENTIALS_FILE=db_credentials.txt\""));
        assert!(script.contains("if not exist \"!CREDENTIALS_PATH!\" goto PROMPT_CREDENTIALS"));
        assert!(script.contains(">\"!CREDENTIALS_PATH!\" echo !DB_USER!,!DB_PASS!,!DB_DSN!"));
        assert!(script.contains("if /i \"!USE_LAST_ENV!\"==\"Y\" goto CONNECT"));
    }

    #[test]
    fn test_steps_run_in_order() {
        let script = render(&GeneratorConfig::default());

        let connect = script.find("sqlplus -L -S \"!DB_USER!/!DB_PASS!@!DB_DSN!\" <NUL");
        let drop = script.find("!DROP_SCRIPT_NAME!\"\n");
        let create = script.find("!CREATE_SCRIPT_NAME!\"\n");
        let load = script.find("powershell.exe -NoProfile -ExecutionPolicy Bypass");
        assert!(connect.is_some() && drop.is_some() && create.is_some() && load.is_some());
        assert!(connect < drop && drop < create && create < load);
    }

    #[test]
    fn test_exit_code_messages() {
        let script = render(&GeneratorConfig::default());

        assert!(script.contains("echo DROP TABLE script finished successfully."));
        assert!(script.contains("echo WARNING: CREATE TABLE script finished with warnings."));
        assert!(script.contains("echo ERROR: CREATE TABLE script failed with exit code !STEP_EXIT!."));
        assert!(script.contains(") else if \"!STEP_EXIT!\"==\"2\" ("));
    }

    #[test]
    fn test_execution_dir() {
        let script = render(&GeneratorConfig::default());
        assert!(script.contains("set \"LOCAL_EXEC_PATH=%~dp0\""));

        let mut config = GeneratorConfig::default();
        config.target.execution_dir = Some(r"\\tsclient\C\cargas".to_owned());
        let script = render(&config);
        assert!(script.contains(r#"set "LOCAL_EXEC_PATH=\\tsclient\C\cargas""#));
    }
}
