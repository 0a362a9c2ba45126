//! `SQL*Plus` scripts for the target table.

use super::format_timestamp;
use crate::schema::TableSchema;
use chrono::NaiveDateTime;

/// Oracle error raised when the table does not exist.
pub const TABLE_NOT_FOUND_SQLCODE: i32 = -942;

/// DROP TABLE wrapped in a PL/SQL block. A missing table is reported and
/// ignored; any other error aborts the script with a failure exit code.
pub fn render_drop_table(schema: &TableSchema, generated_at: NaiveDateTime) -> String {
    let quoted = schema.quoted_name();
    let name = &schema.name;
    let timestamp = format_timestamp(generated_at);

    format!(
        r"-- Drops table {name}
-- Generated: {timestamp}

SET ECHO ON
SET FEEDBACK ON
SET SERVEROUTPUT ON
WHENEVER SQLERROR EXIT FAILURE ROLLBACK

BEGIN
    EXECUTE IMMEDIATE 'DROP TABLE {quoted} CASCADE CONSTRAINTS';
    DBMS_OUTPUT.PUT_LINE('Table {name} dropped.');
EXCEPTION
    WHEN OTHERS THEN
        IF SQLCODE = {TABLE_NOT_FOUND_SQLCODE} THEN
            DBMS_OUTPUT.PUT_LINE('Table {name} does not exist, nothing to drop.');
        ELSE
            DBMS_OUTPUT.PUT_LINE('Failed to drop table {name}: ' || SQLERRM);
            RAISE;
        END IF;
END;
/

EXIT;
"
    )
}

/// CREATE TABLE with one typed column per decision, in input order, followed
/// by the grant and a verification query.
pub fn render_create_table(
    schema: &TableSchema,
    grant_user: &str,
    generated_at: NaiveDateTime,
) -> String {
    let quoted = schema.quoted_name();
    let name = &schema.name;
    let timestamp = format_timestamp(generated_at);
    let columns = schema
        .columns
        .iter()
        .map(|c| format!("    {}", c.ddl()))
        .collect::<Vec<_>>()
        .join(",\n");

    format!(
        r"-- Creates table {name} and grants access to {grant_user}
-- Generated: {timestamp}

SET DEFINE OFF
SET ESCAPE OFF
WHENEVER SQLERROR EXIT FAILURE

CREATE TABLE {quoted} (
{columns}
);

GRANT ALL ON {quoted} TO {grant_user};

PROMPT Table {quoted} created.
SELECT 'Table ' || table_name || ' created in schema ' || owner || '.'
  FROM ALL_TABLES
 WHERE TABLE_NAME = '{name}'
   AND OWNER = USER;

EXIT;
"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scripts::test_support::{convenio_plano, generated_at};

    #[test]
    fn test_drop_tolerates_missing_table() {
        let script = render_drop_table(&convenio_plano(), generated_at());

        assert!(script.contains(
            "EXECUTE IMMEDIATE 'DROP TABLE \"TT_OPE_CONVENIO_PLANO\" CASCADE CONSTRAINTS';"
        ));
        assert!(script.contains("IF SQLCODE = -942 THEN"));
        assert!(script.contains("RAISE;"));
        assert!(script.contains("WHENEVER SQLERROR EXIT FAILURE ROLLBACK"));
        assert!(script.contains("-- Generated: 2025-03-14 09:26:53"));
        assert!(script.trim_end().ends_with("EXIT;"));
    }

    #[test]
    fn test_create_lists_columns_in_order() {
        let script = render_create_table(&convenio_plano(), "HUMASTER", generated_at());

        let expected = "CREATE TABLE \"TT_OPE_CONVENIO_PLANO\" (\n    \"NM_PLANO\" VARCHAR2(7),\n    \"CD_CODIGO\" VARCHAR2(3),\n    \"NU_COL_1\" NUMBER,\n    \"DT_INICIO\" DATE\n);";
        assert!(script.contains(expected), "{script}");
        assert!(script.contains("GRANT ALL ON \"TT_OPE_CONVENIO_PLANO\" TO HUMASTER;"));
        assert!(script.contains("WHERE TABLE_NAME = 'TT_OPE_CONVENIO_PLANO'"));
        assert!(script.contains("SET DEFINE OFF"));
    }

    #[test]
    fn test_create_does_not_rerun_statements() {
        // A lone slash after a terminated statement makes SQL*Plus run it twice.
        let script = render_create_table(&convenio_plano(), "HUMASTER", generated_at());
        assert!(!script.lines().any(|line| line.trim() == "/"));
    }

    #[test]
    fn test_output_is_deterministic() {
        let schema = convenio_plano();
        assert_eq!(
            render_create_table(&schema, "HUMASTER", generated_at()),
            render_create_table(&schema, "HUMASTER", generated_at())
        );
    }
}
