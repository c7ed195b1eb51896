use clap::{ArgAction, Parser};
use respkv::client::{parse_line, Client, Input};
use respkv::server::DEFAULT_PORT;
use respkv::Error;
use tokio::io::{self, AsyncBufReadExt, AsyncWriteExt, BufReader};

/// Interactive shell for a respkv server
#[derive(Parser, Debug)]
#[command(disable_help_flag = true)]
struct Args {
    /// Server hostname
    #[arg(short, long, default_value = "127.0.0.1")]
    host: String,

    /// Server port
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Print help
    #[arg(long, action = ArgAction::Help)]
    help: Option<bool>,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    if let Err(e) = repl(&args.host, args.port).await {
        println!("Error: {}", e);
    }
}

async fn repl(host: &str, port: u16) -> Result<(), Error> {
    let address = format!("{}:{}", host, port);
    let mut client = Client::connect(&address).await?;

    let mut lines = BufReader::new(io::stdin()).lines();
    let mut stdout = io::stdout();

    loop {
        stdout.write_all(format!("{}> ", address).as_bytes()).await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        let args = match parse_line(&line) {
            Input::Exit => break,
            Input::Skip => continue,
            Input::Command(args) => args,
        };

        let reply = client.send(args).await?;
        println!("{}", reply);
    }

    Ok(())
}
