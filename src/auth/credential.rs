//! Immutable bearer credential issued by the authorization server, plus its parsers.
//!
//! Credentials arrive in two shapes: the percent-encoded `key=value&...` fragment of the
//! interactive redirect, and the token endpoint's JSON body after a refresh. Both funnel
//! through the same field validation so a [`Credential`] always carries an access token, an
//! instance URL, and an identity URL ending in `{org_id}/{user_id}`.

// self
use crate::{
	_prelude::*,
	auth::{OrgId, TokenSecret, UserId, UserIdentifier},
	error::ParseError,
};

const ACCESS_TOKEN: &str = "access_token";
const INSTANCE_URL: &str = "instance_url";
const IDENTITY_URL: &str = "id";
const ISSUED_AT: &str = "issued_at";
const REFRESH_TOKEN: &str = "refresh_token";
const SITE_URL: &str = "sfdc_site_url";
const SITE_ID: &str = "sfdc_site_id";

/// Parses a percent-encoded OAuth body (redirect fragment or form response) into a
/// [`Credential`].
///
/// Refresh responses omit `refresh_token`, so `fallback_refresh_token` is carried into the
/// new credential when the body has none.
pub fn parse_credential(
	percent_encoded: &str,
	fallback_refresh_token: Option<&TokenSecret>,
) -> Result<Credential, ParseError> {
	Credential::from_fields(&form_fields(percent_encoded), fallback_refresh_token)
}

/// Decodes `key=value&...` pairs, keeping the first occurrence of each key.
pub(crate) fn form_fields(percent_encoded: &str) -> BTreeMap<String, String> {
	let mut fields = BTreeMap::new();

	for (key, value) in url::form_urlencoded::parse(percent_encoded.as_bytes()) {
		fields.entry(key.into_owned()).or_insert_with(|| value.into_owned());
	}

	fields
}

/// Authenticated session for a single user.
///
/// The value is immutable: refreshing produces a new credential rather than editing this one.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "CredentialRepr", into = "CredentialRepr")]
pub struct Credential {
	access_token: TokenSecret,
	instance_url: Url,
	identity_url: Url,
	timestamp: OffsetDateTime,
	refresh_token: Option<TokenSecret>,
	site_url: Option<Url>,
	site_id: Option<String>,
	user: UserIdentifier,
}
impl Credential {
	/// Parses the JSON body returned by the token endpoint.
	pub fn from_json(
		body: &[u8],
		fallback_refresh_token: Option<&TokenSecret>,
	) -> Result<Self, ParseError> {
		let raw: BTreeMap<String, serde_json::Value> =
			serde_path_to_error::deserialize(&mut serde_json::Deserializer::from_slice(body))?;
		let fields = raw
			.into_iter()
			.filter_map(|(key, value)| match value {
				serde_json::Value::String(text) => Some((key, text)),
				serde_json::Value::Number(number) => Some((key, number.to_string())),
				serde_json::Value::Bool(flag) => Some((key, flag.to_string())),
				_ => None,
			})
			.collect();

		Self::from_fields(&fields, fallback_refresh_token)
	}

	pub(crate) fn from_fields(
		fields: &BTreeMap<String, String>,
		fallback_refresh_token: Option<&TokenSecret>,
	) -> Result<Self, ParseError> {
		let access_token = TokenSecret::new(required(fields, ACCESS_TOKEN)?);
		let instance_url = parse_url(INSTANCE_URL, required(fields, INSTANCE_URL)?)?;
		let identity_url = parse_url(IDENTITY_URL, required(fields, IDENTITY_URL)?)?;
		let issued_at = required(fields, ISSUED_AT)?;
		let millis = issued_at
			.trim()
			.parse::<i64>()
			.map_err(|_| ParseError::InvalidTimestamp { value: issued_at.to_owned() })?;
		let timestamp = timestamp_from_millis(millis)
			.ok_or_else(|| ParseError::InvalidTimestamp { value: issued_at.to_owned() })?;
		let refresh_token = optional(fields, REFRESH_TOKEN)
			.map(TokenSecret::new)
			.or_else(|| fallback_refresh_token.cloned());
		let site_url = optional(fields, SITE_URL).map(|raw| parse_url(SITE_URL, raw)).transpose()?;
		let site_id = optional(fields, SITE_ID).map(str::to_owned);
		let user = UserIdentifier::from_identity_url(&identity_url)
			.ok_or_else(|| ParseError::InvalidIdentityUrl { url: identity_url.to_string() })?;

		Ok(Self {
			access_token,
			instance_url,
			identity_url,
			timestamp,
			refresh_token,
			site_url,
			site_id,
			user,
		})
	}

	/// Access token secret; callers must avoid logging it.
	pub fn access_token(&self) -> &TokenSecret {
		&self.access_token
	}

	/// Base URL for API calls against the user's instance.
	pub fn instance_url(&self) -> &Url {
		&self.instance_url
	}

	/// Identity URL encoding the org and user identifiers.
	pub fn identity_url(&self) -> &Url {
		&self.identity_url
	}

	/// Issuance instant reported by the server.
	pub fn timestamp(&self) -> OffsetDateTime {
		self.timestamp
	}

	/// Long-lived refresh token, when the grant issued one.
	pub fn refresh_token(&self) -> Option<&TokenSecret> {
		self.refresh_token.as_ref()
	}

	/// Community/site URL for multi-tenant site logins.
	pub fn site_url(&self) -> Option<&Url> {
		self.site_url.as_ref()
	}

	/// Community/site identifier for multi-tenant site logins.
	pub fn site_id(&self) -> Option<&str> {
		self.site_id.as_deref()
	}

	/// Non-secret key addressing this credential in a store.
	pub fn user_identifier(&self) -> &UserIdentifier {
		&self.user
	}

	/// Organization identifier (second-to-last identity URL segment).
	pub fn org_id(&self) -> &OrgId {
		&self.user.org_id
	}

	/// User identifier (last identity URL segment).
	pub fn user_id(&self) -> &UserId {
		&self.user.user_id
	}
}
impl Debug for Credential {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Credential")
			.field("access_token", &"<redacted>")
			.field("instance_url", &self.instance_url.as_str())
			.field("identity_url", &self.identity_url.as_str())
			.field("timestamp", &self.timestamp)
			.field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
			.field("site_url", &self.site_url.as_ref().map(Url::as_str))
			.field("site_id", &self.site_id)
			.finish()
	}
}

#[derive(Serialize, Deserialize)]
struct CredentialRepr {
	access_token: TokenSecret,
	instance_url: Url,
	identity_url: Url,
	issued_at: i64,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	refresh_token: Option<TokenSecret>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	site_url: Option<Url>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	site_id: Option<String>,
}
impl TryFrom<CredentialRepr> for Credential {
	type Error = ParseError;

	fn try_from(repr: CredentialRepr) -> Result<Self, Self::Error> {
		let timestamp = timestamp_from_millis(repr.issued_at)
			.ok_or_else(|| ParseError::InvalidTimestamp { value: repr.issued_at.to_string() })?;
		let user = UserIdentifier::from_identity_url(&repr.identity_url)
			.ok_or_else(|| ParseError::InvalidIdentityUrl { url: repr.identity_url.to_string() })?;

		Ok(Self {
			access_token: repr.access_token,
			instance_url: repr.instance_url,
			identity_url: repr.identity_url,
			timestamp,
			refresh_token: repr.refresh_token,
			site_url: repr.site_url,
			site_id: repr.site_id,
			user,
		})
	}
}
impl From<Credential> for CredentialRepr {
	fn from(credential: Credential) -> Self {
		let millis = credential.timestamp.unix_timestamp_nanos() / 1_000_000;

		Self {
			access_token: credential.access_token,
			instance_url: credential.instance_url,
			identity_url: credential.identity_url,
			issued_at: i64::try_from(millis).unwrap_or(i64::MAX),
			refresh_token: credential.refresh_token,
			site_url: credential.site_url,
			site_id: credential.site_id,
		}
	}
}

fn required<'a>(
	fields: &'a BTreeMap<String, String>,
	field: &'static str,
) -> Result<&'a str, ParseError> {
	optional(fields, field).ok_or(ParseError::MissingField { field })
}

fn optional<'a>(fields: &'a BTreeMap<String, String>, field: &str) -> Option<&'a str> {
	fields.get(field).map(String::as_str).filter(|value| !value.is_empty())
}

fn parse_url(field: &'static str, raw: &str) -> Result<Url, ParseError> {
	Url::parse(raw).map_err(|source| ParseError::InvalidUrl { field, source })
}

fn timestamp_from_millis(millis: i64) -> Option<OffsetDateTime> {
	OffsetDateTime::from_unix_timestamp_nanos(i128::from(millis) * 1_000_000).ok()
}
