//! Existence polling between "transfer acknowledged" and "safe to delete locally".

use log::{debug, error};
use std::thread;

use crate::ConfirmPolicy;
use crate::error::ConfirmError;
use crate::store::ObjectStore;

/// Poll `store` until `(bucket, key)` is visible or `policy.max_attempts` checks have failed.
///
/// Checks are strictly sequential with `policy.delay` between them; the first check runs
/// immediately and no delay follows the last. A failing check (as opposed to "not there yet")
/// ends polling at once.
pub fn confirm_upload(
    store: &dyn ObjectStore,
    bucket: &str,
    key: &str,
    policy: &ConfirmPolicy,
) -> Result<(), ConfirmError> {
    let attempts = policy.max_attempts.max(1);
    for attempt in 1..=attempts {
        match store.exists(bucket, key) {
            Ok(true) => {
                debug!("storage://{bucket}/{key} confirmed on attempt {attempt}/{attempts}");
                return Ok(());
            }
            Ok(false) => {
                debug!("storage://{bucket}/{key} not visible yet (attempt {attempt}/{attempts})");
            }
            Err(source) => {
                let err = ConfirmError::Check {
                    bucket: bucket.to_string(),
                    key: key.to_string(),
                    source,
                };
                error!("{err}");
                return Err(err);
            }
        }
        if attempt < attempts {
            thread::sleep(policy.delay);
        }
    }
    error!(
        "ALERT: {key} did not make it to bucket {bucket} after {attempts} checks; local dump kept"
    );
    Err(ConfirmError::Exhausted {
        bucket: bucket.to_string(),
        key: key.to_string(),
        attempts,
    })
}
