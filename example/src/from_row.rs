#![allow(unused)]
use siodb::{Connection, FromRow, Result, execute, query};

#[derive(FromRow)]
struct Deer {
    trid: u64,
    name: String,
    age: Option<i32>,
}

#[derive(FromRow)]
struct DeerTuple(u64, String);

pub fn main() -> Result<()> {
    let mut conn = Connection::connect_env()?;

    execute("CREATE DATABASE example_rows", &mut conn).execute()?;
    execute("CREATE TABLE example_rows.deer (NAME TEXT, AGE INT32)", &mut conn).execute()?;
    execute("INSERT INTO example_rows.deer (NAME, AGE) VALUES ('Deez', 4)", &mut conn).execute()?;

    let datas = query::<_, _, Deer>("SELECT TRID, NAME, AGE FROM example_rows.deer", &mut conn)
        .fetch_all()?;

    assert_eq!(datas[0].name, "Deez");

    let datas = query::<_, _, DeerTuple>("SELECT TRID, NAME FROM example_rows.deer", &mut conn)
        .fetch_all()?;

    execute("DROP DATABASE example_rows", &mut conn).execute()?;

    Ok(())
}
