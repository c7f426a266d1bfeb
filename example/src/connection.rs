use std::env::var;
use siodb::{Config, Connection, Result, query};

pub fn main() -> Result<()> {
    let url = var("SIODB_URL").unwrap();

    let mut conn = Connection::connect(&url)?;
    tracing::info!(session_id = conn.session_id(), "connected");
    query::<_, _, ()>("SHOW DATABASES", &mut conn).fetch_all()?;
    conn.close()?;

    let mut conn = Connection::connect_env()?;
    query::<_, _, ()>("SHOW DATABASES", &mut conn).fetch_all()?;
    conn.close()?;

    let mut config = url.parse::<Config>()?;
    config.set_trace(true);
    let mut conn = Connection::connect_with(&config)?;
    query::<_, _, ()>("SHOW DATABASES", &mut conn).fetch_all()?;
    conn.close()?;

    Ok(())
}
