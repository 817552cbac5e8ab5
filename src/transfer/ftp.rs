//! FTP backend for the report upload.

use std::io::Read;

use suppaftp::types::FileType;
use suppaftp::{FtpError, FtpStream};

use super::{RemoteSession, RemoteStore, TransferError};
use crate::config::RemoteConfig;

/// Reply code for "service not available, closing control connection".
const SERVICE_NOT_AVAILABLE: u32 = 421;

pub struct FtpStore {
    host: String,
    port: u16,
    username: String,
    password: String,
}

impl FtpStore {
    pub fn from_config(config: &RemoteConfig) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
            username: config.username.clone(),
            password: config.password.clone(),
        }
    }
}

/// Where in the exchange a failure happened.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Stage {
    /// TCP connect, greeting and login
    Connect,
    /// Any command after a successful login
    Session,
}

/// Maps an FTP failure onto the transfer error kinds.
///
/// Permanent negative replies (5xx) and 421 mean the server refused us. An I/O
/// failure counts as unavailable only while connecting and logging in. Once the
/// session is up it is a transport fault, like every other failure.
fn classify(stage: Stage, err: FtpError) -> TransferError {
    match &err {
        FtpError::ConnectionError(_) if stage == Stage::Connect => {
            TransferError::Unavailable(err.to_string())
        }
        FtpError::UnexpectedResponse(resp)
            if resp.status.code() >= 500 || resp.status.code() == SERVICE_NOT_AVAILABLE =>
        {
            TransferError::Unavailable(err.to_string())
        }
        _ => TransferError::Transport(err.to_string()),
    }
}

fn in_session(err: FtpError) -> TransferError {
    classify(Stage::Session, err)
}

impl RemoteStore for FtpStore {
    type Session = FtpSession;

    fn connect(&self) -> Result<FtpSession, TransferError> {
        tracing::debug!("Connecting to ftp://{}:{}", self.host, self.port);
        let connecting = |err| classify(Stage::Connect, err);
        let mut stream = FtpStream::connect((self.host.as_str(), self.port)).map_err(connecting)?;
        stream
            .login(self.username.as_str(), self.password.as_str())
            .map_err(connecting)?;
        Ok(FtpSession { stream })
    }
}

pub struct FtpSession {
    stream: FtpStream,
}

impl RemoteSession for FtpSession {
    fn change_dir(&mut self, dir: &str) -> Result<(), TransferError> {
        self.stream.cwd(dir).map_err(in_session)
    }

    fn store(&mut self, name: &str, mut reader: &mut dyn Read) -> Result<(), TransferError> {
        self.stream.transfer_type(FileType::Binary).map_err(in_session)?;
        let written = self.stream.put_file(name, &mut reader).map_err(in_session)?;
        tracing::debug!("Stored {} ({} bytes)", name, written);
        Ok(())
    }

    fn finish(mut self) -> Result<(), TransferError> {
        self.stream.quit().map_err(in_session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transfer::Dispatcher;
    use std::io::{BufRead, BufReader, Write};
    use std::net::{TcpListener, TcpStream};
    use std::thread::{self, JoinHandle};
    use tempfile::tempdir;

    const LOG: &str = "Report from: pingu_03\nMon Jan 02 2023 14:05:09\n";

    /// Server side of one scripted control connection.
    struct Control {
        reader: BufReader<TcpStream>,
        writer: TcpStream,
    }

    impl Control {
        fn reply(&mut self, line: &str) {
            write!(self.writer, "{}\r\n", line).unwrap();
        }

        /// Reads the next command, checks its verb and returns the argument.
        fn expect(&mut self, verb: &str) -> String {
            let mut line = String::new();
            self.reader.read_line(&mut line).unwrap();
            let line = line.trim_end();
            assert!(line.starts_with(verb), "expected {}, got {:?}", verb, line);
            line[verb.len()..].trim().to_string()
        }

        fn log_in(&mut self) {
            self.reply("220 fake ready");
            self.expect("USER");
            self.reply("331 password please");
            self.expect("PASS");
            self.reply("230 logged in");
        }

        fn passive_reply(&mut self, port: u16) {
            self.reply(&format!(
                "227 Entering Passive Mode (127,0,0,1,{},{})",
                port / 256,
                port % 256
            ));
        }
    }

    /// Runs `script` against the first client on a loopback port.
    fn serve<T, F>(script: F) -> (u16, JoinHandle<T>)
    where
        T: Send + 'static,
        F: FnOnce(&mut Control) -> T + Send + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let handle = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut control = Control {
                reader: BufReader::new(stream.try_clone().unwrap()),
                writer: stream,
            };
            script(&mut control)
        });
        (port, handle)
    }

    fn free_port() -> u16 {
        // Bind then drop to get a local port nothing listens on
        TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap().port()
    }

    fn store_at(port: u16) -> FtpStore {
        FtpStore::from_config(&RemoteConfig {
            host: "127.0.0.1".to_string(),
            port,
            ..RemoteConfig::default()
        })
    }

    fn send_log(port: u16) -> Result<(), TransferError> {
        let dir = tempdir().unwrap();
        let path = dir.path().join("penguins_report.txt");
        std::fs::write(&path, LOG).unwrap();
        Dispatcher::new(store_at(port), "pycamp").send(&path)
    }

    #[test]
    fn test_unreachable_server_is_unavailable() {
        let result = store_at(free_port()).connect();

        assert!(matches!(result, Err(TransferError::Unavailable(_))));
    }

    #[test]
    fn test_upload_stores_log_in_binary_mode() {
        let (port, server) = serve(|control| {
            control.log_in();
            let dir = control.expect("CWD");
            control.reply("250 directory changed");
            let mode = control.expect("TYPE");
            control.reply("200 type set");

            let data = TcpListener::bind("127.0.0.1:0").unwrap();
            control.expect("PASV");
            control.passive_reply(data.local_addr().unwrap().port());
            let name = control.expect("STOR");
            control.reply("150 ok to send data");
            let (mut upload, _) = data.accept().unwrap();
            let mut bytes = String::new();
            std::io::Read::read_to_string(&mut upload, &mut bytes).unwrap();
            control.reply("226 transfer complete");

            control.expect("QUIT");
            control.reply("221 bye");
            (dir, mode, name, bytes)
        });

        send_log(port).unwrap();

        let (dir, mode, name, bytes) = server.join().unwrap();
        assert_eq!(dir, "pycamp");
        assert_eq!(mode, "I");
        assert_eq!(name, "penguins_report.txt");
        assert_eq!(bytes, LOG);
    }

    #[test]
    fn test_refused_login_is_unavailable() {
        let (port, server) = serve(|control| {
            control.reply("220 fake ready");
            control.expect("USER");
            control.reply("331 password please");
            control.expect("PASS");
            control.reply("530 Login incorrect");
        });

        let result = send_log(port);

        server.join().unwrap();
        assert!(matches!(result, Err(TransferError::Unavailable(_))), "{:?}", result);
    }

    #[test]
    fn test_denied_directory_is_unavailable() {
        let (port, server) = serve(|control| {
            control.log_in();
            control.expect("CWD");
            control.reply("550 No such directory");
        });

        let result = send_log(port);

        server.join().unwrap();
        assert!(matches!(result, Err(TransferError::Unavailable(_))), "{:?}", result);
    }

    #[test]
    fn test_service_not_available_greeting_is_unavailable() {
        let (port, server) = serve(|control| {
            control.reply("421 Too many connections");
        });

        let result = send_log(port);

        server.join().unwrap();
        assert!(matches!(result, Err(TransferError::Unavailable(_))), "{:?}", result);
    }

    #[test]
    fn test_transient_data_connection_reply_is_transport_fault() {
        let (port, server) = serve(|control| {
            control.log_in();
            control.expect("CWD");
            control.reply("250 directory changed");
            control.expect("TYPE");
            control.reply("200 type set");

            let data = TcpListener::bind("127.0.0.1:0").unwrap();
            control.expect("PASV");
            control.passive_reply(data.local_addr().unwrap().port());
            control.expect("STOR");
            control.reply("425 Can't open data connection");
            data
        });

        let result = send_log(port);

        drop(server.join().unwrap());
        assert!(matches!(result, Err(TransferError::Transport(_))), "{:?}", result);
    }

    #[test]
    fn test_data_connection_failure_after_login_is_transport_fault() {
        let (port, server) = serve(|control| {
            control.log_in();
            control.expect("CWD");
            control.reply("250 directory changed");
            control.expect("TYPE");
            control.reply("200 type set");
            control.expect("PASV");
            control.passive_reply(free_port());
            control.expect("STOR");
        });

        let result = send_log(port);

        server.join().unwrap();
        assert!(matches!(result, Err(TransferError::Transport(_))), "{:?}", result);
    }

    #[test]
    fn test_io_failure_is_unavailable_only_while_connecting() {
        let io = || FtpError::ConnectionError(std::io::Error::other("reset"));

        assert!(matches!(classify(Stage::Connect, io()), TransferError::Unavailable(_)));
        assert!(matches!(classify(Stage::Session, io()), TransferError::Transport(_)));
    }
}
