pub mod invoice;

pub use invoice::{ClientInfo, Invoice, InvoiceData, InvoiceYear, ValidationError};
