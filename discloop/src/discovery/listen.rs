// discloop/src/discovery/listen.rs
//! Target (listen) mode: wait for a remote initiator to activate us.

use log::{debug, trace};

use crate::discovery::DiscLoop;
use crate::error::{Error, ErrorKind, Result};
use crate::types::Status;
use crate::utils::bytes_to_hex_spaced;

pub(crate) fn listen(dl: &mut DiscLoop) -> Result<Status> {
    let passive = dl.config.pas_listen;
    let active = dl.config.act_listen;
    if passive.is_empty() && active.is_empty() {
        return Err(Error::InvalidParameter("no listen technology configured"));
    }

    dl.rf_off()?;
    dl.listen = None;
    let mut retries = dl.config.target_retry_count;
    loop {
        match dl.hal.autocoll(passive, active) {
            Ok(activation) => {
                debug!(
                    "activated by peer on {} ({})",
                    activation.technology,
                    if activation.active { "active" } else { "passive" }
                );
                trace!("first frame {}", bytes_to_hex_spaced(&activation.frame));
                dl.listen = Some(activation);
                return Ok(Status::ActivatedByPeer);
            }
            Err(e) if e.kind == ErrorKind::RfOff => return Ok(Status::ExternalRfOff),
            Err(e)
                if retries > 0
                    && matches!(
                        e.kind,
                        ErrorKind::IoTimeout | ErrorKind::Integrity | ErrorKind::Protocol
                    ) =>
            {
                retries -= 1;
                trace!("autocoll {}, {} retries left", e, retries);
            }
            Err(e) => return Err(e.into()),
        }
    }
}
