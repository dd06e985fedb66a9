pub mod bitmap;
pub mod edns;
pub mod enums;
pub mod header;
pub mod question;
pub mod resource;
pub mod wire;

pub use bitmap::build_bitmap;
pub use edns::{EdnsOpt, EdnsOption};
pub use enums::{DNSResourceClass, DNSResourceType, ResponseCode};
pub use header::{DNSHeader, HEADER_LEN};
pub use question::{DNSQuery, DNSQuestion, parse_message, parse_query, parse_questions};
pub use resource::{RData, ResourceRecord};
