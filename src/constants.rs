//! Constants

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    pub(crate) static ref RE_PERSON_NAME: Regex =
        Regex::new(r"^[\p{L}][\p{L} '\.\-]*$").expect("person name pattern is valid");
}

// for authorized sessions
pub(crate) const SESSION_COOKIE_NAME: &str = "psessid";
pub(crate) const SESSION_DURATION_SECS: i64 = 1209600;

// inline error shown when a submission fails for reasons the user can't fix
pub(crate) const GENERIC_ERROR_MESSAGE: &str = "Something went wrong on our end, please try again.";

pub(crate) const DEFAULT_ADDR: &str = "127.0.0.1:3000";
pub(crate) const DEFAULT_UPLOAD_DIR: &str = "public/uploads";
pub(crate) const MIN_SESSION_SECRET_LEN: usize = 64;
