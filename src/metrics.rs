use crate::Error;
use lazy_static::lazy_static;
use prometheus::{register_histogram, register_int_counter_vec, Histogram, IntCounterVec};

lazy_static! {
    pub static ref VERIFICATIONS: IntCounterVec = register_int_counter_vec!(
        "contract_verifier_verifications",
        "number of finished verifications by outcome",
        &["status"],
    )
    .unwrap();
    pub static ref COMPILE_TIME: Histogram = register_histogram!(
        "contract_verifier_compile_time_seconds",
        "contract compilation time in seconds",
        vec![0.05, 0.1, 0.25, 0.5, 0.75, 1.0, 2.5, 5.0, 7.5, 10.0, 20.0, 60.0],
    )
    .unwrap();
}

pub fn count_verification(result: &Result<bool, Error>) {
    let status = match result {
        Ok(true) => "verified",
        Ok(false) => "mismatch",
        Err(Error::Client(_)) => "client_error",
        Err(Error::Server(_)) => "server_error",
    };
    VERIFICATIONS.with_label_values(&[status]).inc();
}
