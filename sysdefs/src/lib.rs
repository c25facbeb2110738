pub mod arch;
pub mod partition_types;
