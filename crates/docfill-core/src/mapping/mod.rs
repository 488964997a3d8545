//! Smart field mapping: reconciling placeholder keys with answer keys.

pub mod alias;
pub mod mapper;

pub use alias::AliasTable;
pub use mapper::FieldMapper;
