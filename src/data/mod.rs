pub mod lookup;
pub mod registry;
pub mod tournament;

pub use lookup::{AliasEntry, AliasMap, LookupTables, NicknameEntry, NicknameMap};
pub use tournament::RawTable;
