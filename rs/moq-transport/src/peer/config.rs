use std::time::Duration;

use crate::message::Role;

/// Session settings, flattened into an application's CLI or loaded from a config file.
#[derive(clap::Args, Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(deny_unknown_fields, default))]
pub struct PeerConfig {
	/// The role advertised during setup.
	#[arg(long = "moq-role", env = "MOQ_ROLE", value_enum, default_value_t = Role::Both)]
	pub role: Role,

	/// How long to wait for the response to an announce or subscribe.
	#[arg(
		long = "moq-request-timeout",
		env = "MOQ_REQUEST_TIMEOUT",
		default_value = "1s",
		value_parser = humantime::parse_duration
	)]
	#[cfg_attr(feature = "serde", serde(with = "humantime_serde"))]
	pub request_timeout: Duration,

	/// How long the setup handshake may take.
	#[arg(
		long = "moq-setup-timeout",
		env = "MOQ_SETUP_TIMEOUT",
		default_value = "5s",
		value_parser = humantime::parse_duration
	)]
	#[cfg_attr(feature = "serde", serde(with = "humantime_serde"))]
	pub setup_timeout: Duration,

	/// How long to keep draining after a GOAWAY before closing the session.
	#[arg(
		long = "moq-drain-timeout",
		env = "MOQ_DRAIN_TIMEOUT",
		default_value = "10s",
		value_parser = humantime::parse_duration
	)]
	#[cfg_attr(feature = "serde", serde(with = "humantime_serde"))]
	pub drain_timeout: Duration,

	/// Accept objects delivered as datagrams.
	#[arg(long = "moq-datagrams", env = "MOQ_DATAGRAMS", default_value_t = true, action = clap::ArgAction::Set)]
	pub datagrams: bool,
}

impl Default for PeerConfig {
	fn default() -> Self {
		Self {
			role: Role::Both,
			request_timeout: Duration::from_secs(1),
			setup_timeout: Duration::from_secs(5),
			drain_timeout: Duration::from_secs(10),
			datagrams: true,
		}
	}
}

#[cfg(test)]
mod tests {
	use clap::Parser;

	use super::*;

	#[derive(Parser)]
	struct Cli {
		#[command(flatten)]
		peer: PeerConfig,
	}

	#[test]
	fn test_defaults_match() {
		let cli = Cli::try_parse_from(["moq"]).unwrap();
		let default = PeerConfig::default();

		assert_eq!(cli.peer.role, default.role);
		assert_eq!(cli.peer.request_timeout, default.request_timeout);
		assert_eq!(cli.peer.setup_timeout, default.setup_timeout);
		assert_eq!(cli.peer.drain_timeout, default.drain_timeout);
		assert_eq!(cli.peer.datagrams, default.datagrams);
	}

	#[test]
	fn test_parse() {
		let cli = Cli::try_parse_from([
			"moq",
			"--moq-role",
			"subscriber",
			"--moq-request-timeout",
			"250ms",
			"--moq-datagrams",
			"false",
		])
		.unwrap();

		assert_eq!(cli.peer.role, Role::Subscriber);
		assert_eq!(cli.peer.request_timeout, Duration::from_millis(250));
		assert!(!cli.peer.datagrams);
	}
}
