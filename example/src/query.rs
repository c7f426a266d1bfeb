use siodb::{Connection, ErrorKind, Result, Row, execute, query, query_row};
use time::OffsetDateTime;

pub fn main() -> Result<()> {
    let mut conn = Connection::connect_env()?;

    // Execute

    execute("CREATE DATABASE example_db", &mut conn).execute()?;
    execute("CREATE TABLE example_db.deer (NAME TEXT, AGE INT32, BORN TIMESTAMP)", &mut conn).execute()?;

    let res = execute(
        "INSERT INTO example_db.deer (NAME, AGE, BORN) VALUES ('Deez', 4, '2020-02-29 13:45:30')",
        &mut conn,
    )
    .execute()?;

    assert_eq!(res.rows_affected, Some(1));

    conn.execute("INSERT INTO example_db.deer (NAME, AGE) VALUES ('Foo', NULL)")?;

    // Queries

    let datas = query::<_, _, (u64, String, Option<i32>)>(
        "SELECT TRID, NAME, AGE FROM example_db.deer",
        &mut conn,
    )
    .fetch_all()?;

    assert_eq!(datas.len(), 2);
    assert_eq!(datas[1].2, None);

    let (name, born) = query::<_, _, (String, OffsetDateTime)>(
        "SELECT NAME, BORN FROM example_db.deer WHERE AGE = 4",
        &mut conn,
    )
    .fetch_one()?;

    assert_eq!(name.as_str(), "Deez");
    tracing::info!(%born, "born");

    let data = query::<_, _, (String,)>("SELECT NAME FROM example_db.deer WHERE AGE = 100", &mut conn)
        .fetch_optional()?;

    assert!(data.is_none());

    for row in query::<_, _, Row>("SELECT * FROM example_db.deer", &mut conn).fetch()? {
        let row = row?;
        let _name: String = row.try_get("name")?;
    }

    // Row by row, closing early

    let mut rows = conn.query("SELECT NAME FROM example_db.deer")?;
    assert_eq!(rows.column_names(), ["NAME"]);
    let first = rows.next_row()?;
    assert!(first.is_some());
    rows.close()?;

    let datas = query_row("SELECT NAME FROM example_db.deer", &mut conn).fetch_all()?;
    assert_eq!(datas.len(), 2);

    // Error case

    let err = conn.execute("SELECT * FROM example_db.nope").unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::Database(_)));

    let err = query::<_, _, (String,)>("SELECT NAME FROM example_db.deer WHERE AGE = 100", &mut conn)
        .fetch_one()
        .unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::RowNotFound(_)));

    execute("DROP DATABASE example_db", &mut conn).execute()?;
    conn.close()?;

    Ok(())
}
