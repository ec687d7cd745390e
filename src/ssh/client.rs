use std::net::ToSocketAddrs;
use std::sync::Arc;

use russh::ChannelMsg;
use russh::client::{Config, Handle, Handler};
use russh::keys::{PrivateKeyWithHashAlg, decode_secret_key};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::debug;

use crate::errors::RoostError;
use crate::keys::KeyMaterial;
use crate::ssh::terminal::{self, RawMode};

pub struct ClientHandler;

impl Handler for ClientHandler {
    type Error = russh::Error;

    // Trust on first use. Instances come and go under these tags and
    // nothing pins their host keys.
    async fn check_server_key(&mut self, _: &russh::keys::PublicKey) -> Result<bool, Self::Error> {
        Ok(true)
    }
}

pub struct Client {
    handle: Handle<ClientHandler>,
}

/// Captured output of a one-shot remote command.
#[derive(Debug)]
pub struct ExecOutput {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub exit_status: u32,
}

impl Client {
    pub async fn connect(
        host: &str,
        port: u16,
        username: &str,
        key: &KeyMaterial,
    ) -> Result<Self, RoostError> {
        let config = Arc::new(Config::default());
        let addr = (host, port)
            .to_socket_addrs()
            .map_err(|err| {
                RoostError::ConnectionFailed(format!("{host}:{port} did not resolve: {err}"))
            })?
            .next()
            .ok_or_else(|| {
                RoostError::ConnectionFailed(format!("{host}:{port} did not resolve"))
            })?;

        debug!(host = %host, port = port, user = %username, "connecting");
        let mut handle = russh::client::connect(config, addr, ClientHandler).await?;
        let key = decode_secret_key(&key.data, None)?;
        auth_with_key(&mut handle, username, key).await?;
        Ok(Client { handle })
    }

    pub async fn disconnect(&self) -> Result<(), RoostError> {
        self.handle
            .disconnect(russh::Disconnect::ByApplication, "", "")
            .await?;
        Ok(())
    }

    /// Run one command, capture its streams, hand back the remote exit
    /// status.
    pub async fn execute(&self, command: &str) -> Result<ExecOutput, RoostError> {
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let mut exit_status = None;

        let mut channel = self.handle.channel_open_session().await?;
        channel.exec(true, command).await?;

        while let Some(msg) = channel.wait().await {
            match msg {
                ChannelMsg::Data { ref data } => stdout.extend_from_slice(data),
                ChannelMsg::ExtendedData { ref data, ext: 1 } => stderr.extend_from_slice(data),
                ChannelMsg::ExitStatus { exit_status: code } => exit_status = Some(code),
                _ => {}
            }
        }

        let exit_status = exit_status.ok_or_else(|| {
            RoostError::ConnectionFailed("channel closed before the command finished".to_string())
        })?;
        Ok(ExecOutput {
            stdout,
            stderr,
            exit_status,
        })
    }

    /// Bridge the local terminal to a remote shell until the remote side
    /// hangs up or local stdin closes. Returns the remote exit status when
    /// one was reported.
    pub async fn shell(&self) -> Result<Option<u32>, RoostError> {
        let mut channel = self.handle.channel_open_session().await?;
        let (columns, rows) = terminal::window_size();
        channel
            .request_pty(
                true,
                &terminal::term_name(),
                u32::from(columns),
                u32::from(rows),
                0,
                0,
                &[],
            )
            .await?;
        channel.request_shell(true).await?;

        let mut stdin = tokio::io::stdin();
        let mut stdout = tokio::io::stdout();
        let mut buf = [0u8; 1024];
        let mut stdin_open = true;
        let mut exit_status = None;

        let _raw = RawMode::acquire()?;
        loop {
            tokio::select! {
                read = stdin.read(&mut buf), if stdin_open => match read {
                    Ok(0) => {
                        stdin_open = false;
                        channel.eof().await?;
                    }
                    Ok(n) => channel.data(&buf[..n]).await?,
                    Err(err) => return Err(err.into()),
                },
                msg = channel.wait() => match msg {
                    None => break,
                    Some(ChannelMsg::Data { ref data }) => {
                        stdout.write_all(data).await?;
                        stdout.flush().await?;
                    }
                    Some(ChannelMsg::ExtendedData { ref data, ext: 1 }) => {
                        stdout.write_all(data).await?;
                        stdout.flush().await?;
                    }
                    Some(ChannelMsg::ExitStatus { exit_status: code }) => exit_status = Some(code),
                    Some(ChannelMsg::Close) => break,
                    Some(_) => {}
                },
            }
        }
        Ok(exit_status)
    }
}

async fn auth_with_key(
    handle: &mut Handle<ClientHandler>,
    username: &str,
    key: russh::keys::PrivateKey,
) -> Result<(), RoostError> {
    let key = Arc::new(key);
    let hash = handle.best_supported_rsa_hash().await?.flatten();
    let auth_res = handle
        .authenticate_publickey(username, PrivateKeyWithHashAlg::new(key, hash))
        .await?;
    if auth_res.success() {
        Ok(())
    } else {
        Err(RoostError::ConnectionFailed(format!(
            "authentication rejected for user {username}"
        )))
    }
}
