// self
use crate::{
	_prelude::*,
	config::SignOptions,
	credential::CredentialState,
	http::CredentialIssuer,
	obs::{self, OperationKind, OperationOutcome, OperationSpan},
	presigner::Presigner,
	signature::{self, PresignRequest},
};

impl<I> Presigner<I>
where
	I: ?Sized + CredentialIssuer,
{
	/// Signs `url` with the cached credential and returns the rendered, time-limited URL.
	///
	/// Never suspends. When no usable credential is cached this schedules a background refresh
	/// and returns an empty string; callers retry once [`Presigner::subscribe`] reports a new
	/// credential. Inside the refresh buffer the URL is still signed and a refresh is scheduled
	/// alongside.
	///
	/// Only a malformed or hostless `url` is reported as an error.
	pub fn sign(&self, url: &str, options: &SignOptions) -> Result<String> {
		const KIND: OperationKind = OperationKind::Sign;

		let _span = OperationSpan::new(KIND, "sign").entered();

		obs::record_operation_outcome(KIND, OperationOutcome::Attempt);

		let now = self.clock.now();
		let credential = self.cache.read();
		let state = credential.state_at(now, self.config.refresh_buffer);
		let material = match (state, credential.signing_material()) {
			(CredentialState::Valid | CredentialState::NearExpiry, Some(material)) => {
				if state == CredentialState::NearExpiry {
					self.refresh_in_background();
				}

				material
			},
			_ => {
				self.refresh_in_background();
				obs::record_operation_outcome(KIND, OperationOutcome::Unusable);

				return Ok(String::new());
			},
		};
		let resource = signature::parse_resource_url(url).inspect_err(|_| {
			obs::record_operation_outcome(KIND, OperationOutcome::Failure);
		})?;
		let (method, expires_in) = options.resolve(&self.config);
		let request = PresignRequest {
			url: &resource,
			method,
			expires: signature::expires_at(now, expires_in),
			encoding: self.config.resource_encoding,
			output: &self.config.output,
		};
		let signed = signature::presign(request, material).inspect_err(|_| {
			obs::record_operation_outcome(KIND, OperationOutcome::Failure);
		})?;

		obs::record_operation_outcome(KIND, OperationOutcome::Success);

		Ok(signed)
	}
}
