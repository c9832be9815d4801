// Storage backends. Each store implements every repository trait so that
// operations spanning several tables run as one atomic unit.

mod memory;
mod postgres;

pub use memory::InMemoryStore;
pub use postgres::PostgresStore;
