//! Delivery through a real SMTP conversation with an in-process sink

use mogisend::{
    Address, Config, DebugFlags, DeliveryGateway, EnvelopeAssembler, Identity, Message, Options,
    SendmailError, SmtpGateway, submit,
};
use std::io::{BufRead, BufReader, Cursor, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

/// What the sink received in one mail transaction
#[derive(Debug)]
struct Transaction {
    from: String,
    to: Vec<String>,
    data: String,
}

fn start_sink(reject_rcpt: bool) -> (u16, mpsc::Receiver<Transaction>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let (tx, rx) = mpsc::channel();

    // Start sink in background thread
    thread::spawn(move || {
        for stream in listener.incoming() {
            match stream {
                Ok(stream) => {
                    if let Err(e) = handle_client(stream, &tx, reject_rcpt) {
                        eprintln!("Error handling client: {e}");
                    }
                }
                Err(_) => break,
            }
        }
    });

    (port, rx)
}

fn reply(stream: &mut TcpStream, line: &str) -> std::io::Result<()> {
    stream.write_all(format!("{line}\r\n").as_bytes())?;
    stream.flush()
}

fn path_of(arg: &str) -> String {
    let start = arg.find('<').map_or(0, |i| i + 1);
    let end = arg.find('>').unwrap_or(arg.len());
    arg[start..end].to_string()
}

fn handle_client(
    mut stream: TcpStream,
    tx: &mpsc::Sender<Transaction>,
    reject_rcpt: bool,
) -> std::io::Result<()> {
    let mut reader = BufReader::new(stream.try_clone()?);
    reply(&mut stream, "220 sink.test ESMTP")?;

    let mut from = String::new();
    let mut to = Vec::new();
    let mut line = String::new();
    loop {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            return Ok(()); // Connection closed
        }
        let command = line.trim_end();
        let upper = command.to_ascii_uppercase();

        if upper.starts_with("EHLO") || upper.starts_with("HELO") {
            reply(&mut stream, "250 sink.test")?;
        } else if upper.starts_with("MAIL FROM:") {
            from = path_of(&command[10..]);
            reply(&mut stream, "250 OK")?;
        } else if upper.starts_with("RCPT TO:") {
            if reject_rcpt {
                reply(&mut stream, "550 No such user here")?;
            } else {
                to.push(path_of(&command[8..]));
                reply(&mut stream, "250 OK")?;
            }
        } else if upper == "DATA" {
            reply(&mut stream, "354 End data with <CR><LF>.<CR><LF>")?;
            let mut data = String::new();
            loop {
                line.clear();
                if reader.read_line(&mut line)? == 0 {
                    return Ok(());
                }
                if line == ".\r\n" {
                    break;
                }
                data.push_str(line.strip_prefix('.').unwrap_or(&line));
            }
            let _ = tx.send(Transaction {
                from: std::mem::take(&mut from),
                to: std::mem::take(&mut to),
                data,
            });
            reply(&mut stream, "250 OK")?;
        } else if upper == "QUIT" {
            reply(&mut stream, "221 Bye")?;
            return Ok(());
        } else if upper == "RSET" || upper == "NOOP" {
            reply(&mut stream, "250 OK")?;
        } else {
            reply(&mut stream, "500 Syntax error, command unrecognized")?;
        }
    }
}

fn gateway(port: u16) -> SmtpGateway {
    let config = Config {
        relay: "127.0.0.1".to_string(),
        port,
        ..Config::default()
    };
    SmtpGateway::from_config(&config).unwrap()
}

#[test]
fn test_assembled_message_delivered() {
    let (port, rx) = start_sink(false);

    let input = Cursor::new(
        b"Subject: Test Email\nto: bob@example.com\nbcc: eve@example.com\n\nline one\n.leading dot\n"
            .to_vec(),
    );
    let assembled = EnvelopeAssembler::new(Address::parse("alice@example.com").unwrap())
        .derive_from_headers(true)
        .assemble(Message::read_from(input).unwrap())
        .unwrap();

    let sender = assembled.sender().clone();
    let recipients = assembled.recipients().clone();
    let mut stream = assembled.into_reader();
    gateway(port)
        .send(&sender, recipients.as_slice(), &mut stream)
        .unwrap();

    let email = rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert_eq!(email.from, "alice@example.com");
    assert_eq!(email.to, vec!["bob@example.com", "eve@example.com"]);
    assert_eq!(
        email.data.trim_end(),
        "From: alice@example.com\r\nSubject: Test Email\r\nTo: bob@example.com\r\n\r\nline one\r\n.leading dot"
    );
    assert!(!email.data.contains("eve@example.com"));
}

#[test]
fn test_rejected_recipient_is_delivery_error() {
    let (port, rx) = start_sink(true);

    let sender = Address::parse("alice@example.com").unwrap();
    let to = Address::parse("nobody@example.com").unwrap();
    let mut message: &[u8] = b"Subject: x\n\nbody\n";

    let result = gateway(port).send(&sender, &[to], &mut message);
    assert!(matches!(result, Err(SendmailError::Delivery(_))));
    assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());
}

#[test]
fn test_interactive_submission_over_smtp() {
    let (port, rx) = start_sink(false);

    let options = Options {
        sender_name: Some("Alice".to_string()),
        sender_address: None,
        preserve_single_dots: false,
        recipients_from_headers: false,
        verbose: false,
        debug: DebugFlags::default(),
        recipients: vec!["bob".to_string()],
    };
    let identity = Identity {
        user: Some("alice".to_string()),
        domain: Some("example.com".to_string()),
    };
    let input = Cursor::new(b"Subject: typed\n\nHi Bob\n.\nleftover\n".to_vec());

    submit(&options, &identity, input, true, &gateway(port)).unwrap();

    let email = rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert_eq!(email.from, "alice@example.com");
    assert_eq!(email.to, vec!["bob@example.com"]);
    assert!(email.data.starts_with("From: Alice <alice@example.com>\r\nSubject: typed\r\n\r\n"));
    assert_eq!(email.data.trim_end(), "From: Alice <alice@example.com>\r\nSubject: typed\r\n\r\nHi Bob");
}
