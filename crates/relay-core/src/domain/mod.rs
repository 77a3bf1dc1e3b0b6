//! Domain model (ids, call envelope, record, outcome, errors).

pub mod call;
pub mod errors;
pub mod ids;
pub mod outcome;
pub mod record;

pub use call::{
    AdministrativeCredentials, CallEnvelope, Credentials, DeviceInformation, PowerOnOperation,
    Request, RequestBody, RequestHeader, SoapBody, SoapEnvelope, SoapHeader, UserChr,
    UserDefinedParameters, UserNum,
};
pub use errors::{ErrorKind, InvocationFailure, RelayError};
pub use ids::{CallId, CorrelationId};
pub use outcome::{AttemptResult, CallOutcome, OutcomeStatus};
pub use record::{CallRecord, CallStatus, PARTITION_KEY, VersionToken};
