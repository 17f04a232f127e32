pub mod clamav;
pub mod external;

pub use clamav::ClamAvBackend;
pub use external::ExternalApiBackend;
