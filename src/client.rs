use bytes::Bytes;
use futures::StreamExt;
use tokio::io::AsyncWriteExt;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpStream, ToSocketAddrs};
use tokio_util::codec::FramedRead;

use crate::codec::ReplyCodec;
use crate::frame::Frame;
use crate::Error;

/// One line typed into the shell.
#[derive(Debug, PartialEq)]
pub enum Input {
    Exit,
    /// Nothing to send; the server never answers an empty command.
    Skip,
    Command(Vec<String>),
}

/// Splits a shell line into arguments. There is no quoting: every whitespace separated token is
/// one argument.
pub fn parse_line(line: &str) -> Input {
    let line = line.trim();
    if line == "exit" || line == "quit" {
        return Input::Exit;
    }

    let args: Vec<String> = line.split_whitespace().map(String::from).collect();
    if args.is_empty() {
        Input::Skip
    } else {
        Input::Command(args)
    }
}

/// A connection to the server that issues one command at a time.
pub struct Client {
    reader: FramedRead<OwnedReadHalf, ReplyCodec>,
    writer: OwnedWriteHalf,
}

impl Client {
    pub async fn connect<T: ToSocketAddrs>(addr: T) -> Result<Client, Error> {
        let socket = TcpStream::connect(addr).await?;
        let (reader, writer) = socket.into_split();

        Ok(Client {
            reader: FramedRead::new(reader, ReplyCodec),
            writer,
        })
    }

    /// Sends `args` as a single command and waits for its reply.
    pub async fn send<I, T>(&mut self, args: I) -> Result<Frame, Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<Bytes>,
    {
        let frame = Frame::command(args);
        self.writer.write_all(&frame.serialize()).await?;

        self.read_response().await
    }

    async fn read_response(&mut self) -> Result<Frame, Error> {
        match self.reader.next().await {
            Some(frame) => frame,
            None => Err("connection closed by server".into()),
        }
    }
}
