pub mod blob;
pub mod commit;
pub mod entry_mode;
pub mod object;
pub mod object_id;
pub mod object_type;
pub mod tree;

pub const OBJECT_ID_LENGTH: usize = 40;
pub const RAW_OBJECT_ID_LENGTH: usize = 20;
