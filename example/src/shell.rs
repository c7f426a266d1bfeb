use siodb::{Connection, Result};

pub fn main(statements: &[String]) -> Result<()> {
    let mut conn = Connection::connect_env()?;

    for sql in statements {
        let mut rows = conn.query(sql)?;

        if rows.columns().is_empty() {
            match rows.rows_affected() {
                Some(n) => println!("{n} rows affected"),
                None => println!("OK"),
            }
            continue;
        }

        println!("{}", rows.column_names().join(" | "));
        let mut count = 0;
        while let Some(row) = rows.next_row()? {
            let line = row
                .values()
                .iter()
                .map(|value| match value {
                    Some(value) => value.to_string(),
                    None => "NULL".into(),
                })
                .collect::<Vec<_>>();
            println!("{}", line.join(" | "));
            count += 1;
        }
        println!("({count} rows)");
    }

    conn.close()
}
