pub mod session;
pub mod signup;

/// Name of the cookie carrying the whole session
pub const SESSION_COOKIE: &str = "__session";

/// Session key holding the customer access token
pub const ACCESS_TOKEN_KEY: &str = "customerAccessToken";

/// Route serving the signup form and handling its submission
pub const REGISTER_PATH: &str = "/account/register";
