//! Transport seam.

use crate::error::ServiceError;
use crate::message::Response;
use avdata_timeseries::Uplink;

/// Link to the management server.
///
/// Besides pushing time-series payloads through [`Uplink`], a transport
/// delivers responses to server requests. Execute responses may be sent
/// long after the request, from whichever thread replies.
pub trait Transport: Uplink {
    /// Sends a response.
    ///
    /// # Errors
    ///
    /// [`ServiceError::Transport`] if it could not be delivered.
    fn respond(&self, response: Response) -> Result<(), ServiceError>;
}
