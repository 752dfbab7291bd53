/// Registry search command
pub mod images;

/// Version command handlers
pub mod version;
