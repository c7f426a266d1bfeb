use tracing::trace_span;
use tracing_subscriber::{
    EnvFilter, layer::SubscriberExt, util::SubscriberInitExt,
};

use siodb::Result;

mod connection;
mod query;
mod from_row;
mod shell;

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::Registry::default()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // `example <sql>...` runs each statement against SIODB_URL and prints the result
    let statements = std::env::args().skip(1).collect::<Vec<_>>();
    if !statements.is_empty() {
        return shell::main(&statements);
    }

    trace_span!("connection").in_scope(connection::main)?;
    trace_span!("query").in_scope(query::main)?;
    trace_span!("from_row").in_scope(from_row::main)?;

    Ok(())
}
