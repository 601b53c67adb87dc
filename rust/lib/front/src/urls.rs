use pmp_query::{CString, PageQueryUrl, QueryDefinition};

/// Query key carrying the location to return to after signing in.
pub const RETURN_TO: &str = "returnTo";

/// The sign-in page, `/sign/signIn?returnTo=...`.
pub fn sign_in() -> PageQueryUrl {
    PageQueryUrl::new(
        "/sign/signIn",
        QueryDefinition::builder().field(RETURN_TO, CString).build(),
    )
}
