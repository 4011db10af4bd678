//! Firm registry records (client-held, persisted by the firm store).

pub mod firm;

pub use firm::{Firm, FirmId, FirmPatch, FirmStatus, FirmsState};
