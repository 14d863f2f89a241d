use crate::{
	Error,
	coding::{Stream, Version},
	message::{ClientSetup, Message, Parameters, Role, ServerSetup},
	transport::Connection,
};

use super::PeerConfig;

/// The outcome of a successful handshake.
pub(super) struct Setup<C: Connection> {
	pub stream: Stream<C>,
	pub remote_role: Option<Role>,
}

/// Perform the client side of the handshake.
pub(super) async fn connect<C: Connection>(conn: &C, config: &PeerConfig) -> Result<Setup<C>, Error> {
	let mut stream = Stream::open(conn).await?;

	let mut parameters = Parameters::default();
	parameters.set_role(config.role);

	let client = ClientSetup {
		versions: [Version::DRAFT_00].into(),
		parameters,
	};

	tracing::trace!(?client, "sending client setup");
	stream.writer.encode(&Message::from(client.clone())).await?;

	let server = match stream.reader.decode::<Message>().await? {
		Message::ServerSetup(server) => server,
		msg => return Err(Error::UnexpectedMessage(msg.id())),
	};
	tracing::trace!(?server, "received server setup");

	if !client.versions.contains(&server.version) {
		return Err(Error::Version(client.versions, [server.version].into()));
	}

	// The server is not required to advertise a role.
	let remote_role = server.parameters.role()?;

	Ok(Setup { stream, remote_role })
}

/// Perform the server side of the handshake.
pub(super) async fn accept<C: Connection>(conn: &C, config: &PeerConfig) -> Result<Setup<C>, Error> {
	let mut stream = Stream::accept(conn).await?;

	let client = match stream.reader.decode::<Message>().await? {
		Message::ClientSetup(client) => client,
		msg => return Err(Error::UnexpectedMessage(msg.id())),
	};
	tracing::trace!(?client, "received client setup");

	if !client.versions.contains(&Version::DRAFT_00) {
		return Err(Error::Version(client.versions, [Version::DRAFT_00].into()));
	}

	let role = client.parameters.role()?.ok_or(Error::MissingRole)?;

	let mut parameters = Parameters::default();
	parameters.set_role(config.role);

	let server = ServerSetup {
		version: Version::DRAFT_00,
		parameters,
	};

	tracing::trace!(?server, "sending server setup");
	stream.writer.encode(&Message::from(server)).await?;

	Ok(Setup {
		stream,
		remote_role: Some(role),
	})
}
