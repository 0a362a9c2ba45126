//! `PowerShell` loader companion.
//!
//! The generated script runs on the operator's machine after the table
//! exists. It compares the extract header with the live table catalog,
//! writes the SQL*Loader control and parameter files and runs `sqlldr`.
//! Its exit code follows `sqlldr`: 0 for success, 2 for warnings, 1 for
//! anything else.

use super::ScriptContext;
use crate::schema::OracleType;

/// Date mask matching the timestamps written to the extract.
pub const LOADER_DATE_MASK: &str = "YYYY-MM-DD HH24:MI:SS";

/// Field width for CLOB columns and skipped columns. SQL*Loader defaults
/// character fields to 255 bytes.
const WIDE_FIELD_LEN: usize = 1_048_576;

/// SQL*Loader field definition for a column of the given type.
pub fn loader_field(column_type: &OracleType) -> String {
    match column_type {
        OracleType::Date => format!("DATE \"{LOADER_DATE_MASK}\""),
        OracleType::Varchar2(len) => format!("CHAR({len})"),
        OracleType::Clob => format!("CHAR({WIDE_FIELD_LEN})"),
        OracleType::Number | OracleType::Flag => "CHAR".to_owned(),
    }
}

/// Single-quoted `PowerShell` literal.
pub(crate) fn ps_quote(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}

/// Generate the loader companion script.
pub fn render_loader_script(ctx: &ScriptContext<'_>) -> String {
    let table = &ctx.schema.name;
    let timestamp = ctx.timestamp();
    let files = ctx.files;
    let target = ctx.target;

    let exec_dir_default = target
        .execution_dir
        .as_deref()
        .map(ps_quote)
        .unwrap_or_else(|| "$PSScriptRoot".to_owned());
    let delimiter = ps_quote(&ctx.delimiter.to_string());
    let data_file = ps_quote(&files.data_file);
    let control_file = ps_quote(&files.control_file);
    let parameter_file = ps_quote(&files.parameter_file);
    let oracle_home = ps_quote(&target.oracle_home);
    let nls_lang = ps_quote(&target.nls_lang);
    let nls_numeric = ps_quote(&target.nls_numeric_characters);
    let batch_driver = &files.batch_driver;
    let data_file_name = &files.data_file;

    let field_specs = ctx
        .schema
        .columns
        .iter()
        .map(|c| {
            format!(
                "    {} = {}",
                ps_quote(&c.identifier),
                ps_quote(&loader_field(&c.column_type))
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r##"<#
.SYNOPSIS
    Loads {data_file_name} into {table} with SQL*Loader.

.DESCRIPTION
    Reads the extract header, keeps the columns that exist in the table,
    writes the control and parameter files and runs sqlldr.
    Credentials default to the DB_USER_SQL, DB_PASS_SQL and DB_DSN_SQL
    environment variables set by {batch_driver}.

.NOTES
    Table: {table}
    Generated: {timestamp}
#>

param(
    [Parameter(Mandatory=$false)]
    [string]$DbUser = $env:DB_USER_SQL,

    [Parameter(Mandatory=$false)]
    [string]$DbPassword = $env:DB_PASS_SQL,

    [Parameter(Mandatory=$false)]
    [string]$DbDsn = $env:DB_DSN_SQL,

    [Parameter(Mandatory=$false)]
    [string]$ExecDir = {exec_dir_default}
)

$ErrorActionPreference = "Stop"

function Write-Info {{
    param([string]$Message)
    Write-Host "[INFO] $Message" -ForegroundColor Cyan
}}

function Write-Success {{
    param([string]$Message)
    Write-Host "[SUCCESS] $Message" -ForegroundColor Green
}}

function Write-Failure {{
    param([string]$Message)
    Write-Host "[ERROR] $Message" -ForegroundColor Red
}}

function Write-Warn {{
    param([string]$Message)
    Write-Host "[WARNING] $Message" -ForegroundColor Yellow
}}

if (-not $DbUser -or -not $DbPassword -or -not $DbDsn) {{
    Write-Failure "Database credentials missing. Run {batch_driver} or pass -DbUser, -DbPassword and -DbDsn."
    exit 1
}}

$table = '{table}'
$delimiter = {delimiter}
$csvPath = Join-Path $ExecDir {data_file}
$ctlPath = Join-Path $ExecDir {control_file}
$parPath = Join-Path $ExecDir {parameter_file}
$logPath = Join-Path $ExecDir 'sqlldr.log'
$badPath = Join-Path $ExecDir 'sqlldr.bad'
$dscPath = Join-Path $ExecDir 'sqlldr.dsc'
$describeSql = Join-Path $ExecDir 'temp_describe.sql'

# Field definitions of the columns created by the CREATE TABLE script
$fieldSpecs = @{{
{field_specs}
}}

$env:ORACLE_HOME = {oracle_home}
$env:PATH = "$env:ORACLE_HOME\BIN;$env:PATH"
$env:NLS_LANG = {nls_lang}
$env:NLS_NUMERIC_CHARACTERS = {nls_numeric}

if (-not (Test-Path $csvPath)) {{
    Write-Failure "Data file not found: $csvPath"
    exit 1
}}

Write-Info "Reading extract header: $csvPath"
$header = Get-Content -Path $csvPath -Encoding UTF8 -TotalCount 1
if (-not $header) {{
    Write-Failure "Could not read the extract header."
    exit 1
}}
$csvColumns = @($header.Split($delimiter) | ForEach-Object {{ $_.Trim().Trim('"') }})

Write-Info "Reading the columns of table $table"
@"
SET HEADING OFF
SET FEEDBACK OFF
SET PAGESIZE 0
SET TRIMSPOOL ON
SET LINESIZE 1000
SELECT column_name FROM all_tab_columns
 WHERE table_name = '$table' AND owner = UPPER('$DbUser')
 ORDER BY column_id;
EXIT
"@ | Set-Content -Path $describeSql -Encoding ASCII

try {{
    $describeOutput = & sqlplus -L -S "$DbUser/$DbPassword@$DbDsn" "@$describeSql"
    $describeExit = $LASTEXITCODE
}} catch {{
    Write-Failure "Could not start sqlplus: $($_.Exception.Message)"
    exit 1
}} finally {{
    Remove-Item -Path $describeSql -ErrorAction SilentlyContinue
}}

$tableColumns = @($describeOutput | ForEach-Object {{ "$_".Trim() }} | Where-Object {{ $_ -ne '' }})
if ($describeExit -ne 0 -or $tableColumns.Count -eq 0) {{
    Write-Failure "Could not read the columns of $table. Check user, password, DSN and that the table exists."
    $tableColumns | ForEach-Object {{ Write-Host "  $_" }}
    exit 1
}}

Write-Success "Columns found in table $table"
$tableColumns | ForEach-Object {{ Write-Host "  - $_" }}

# Columns missing from the table stay in the control file as FILLER so the
# remaining fields keep their positions.
$loadedCount = 0
$fields = foreach ($column in $csvColumns) {{
    if ($tableColumns -contains $column) {{
        $spec = $fieldSpecs[$column]
        if (-not $spec) {{
            $spec = 'CHAR'
        }}
        $loadedCount++
        "  `"$column`" $spec"
    }} else {{
        Write-Warn "Skipping extract column '$column', not found in table $table"
        "  `"$column`" FILLER CHAR({WIDE_FIELD_LEN})"
    }}
}}

if ($loadedCount -eq 0) {{
    Write-Failure "No extract column matches a column of $table."
    exit 1
}}

Write-Info "Writing control file: $ctlPath"
$controlLines = @(
    'OPTIONS (SKIP=1)'
    'LOAD DATA'
    'CHARACTERSET AL32UTF8'
    "INFILE '$csvPath'"
    "BADFILE '$badPath'"
    "DISCARDFILE '$dscPath'"
    'APPEND'
    "INTO TABLE `"$table`""
    "FIELDS TERMINATED BY '$delimiter' OPTIONALLY ENCLOSED BY '`"'"
    'TRAILING NULLCOLS'
    '('
    ($fields -join ",`n")
    ')'
)
$controlLines -join "`n" | Set-Content -Path $ctlPath -Encoding ASCII

Write-Info "Writing parameter file: $parPath"
$parameterLines = @(
    "userid=$DbUser/$DbPassword@$DbDsn"
    "control=`"$ctlPath`""
    "log=`"$logPath`""
    "bad=`"$badPath`""
    "data=`"$csvPath`""
)
$parameterLines -join "`n" | Set-Content -Path $parPath -Encoding ASCII

Write-Info "Running SQL*Loader"
try {{
    & sqlldr "PARFILE=$parPath"
    $loadExit = $LASTEXITCODE
}} catch {{
    Write-Failure "Could not start sqlldr: $($_.Exception.Message)"
    exit 1
}}

switch ($loadExit) {{
    0 {{
        Write-Success "Load finished. Log: $logPath"
        exit 0
    }}
    2 {{
        Write-Warn "Load finished with warnings, some rows may have been rejected. Check $logPath and $badPath"
        exit 2
    }}
    default {{
        Write-Failure "SQL*Loader failed with exit code $loadExit. Check $logPath"
        exit 1
    }}
}}
"##
    )
}
