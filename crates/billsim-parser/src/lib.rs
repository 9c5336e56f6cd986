pub mod bill_parser;
pub mod error;
pub mod path_resolver;

pub use bill_parser::{parse_bill_file, Bill, SchemaFamily, Section};
pub use error::ParseError;
pub use path_resolver::{BillPath, PathResolver};
