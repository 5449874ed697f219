mod appointment;
mod customer;
mod service;
mod stylist;

pub use self::appointment::*;
pub use self::customer::*;
pub use self::service::*;
pub use self::stylist::*;
