#[macro_use]
extern crate clap;
#[macro_use]
extern crate log;

mod node_config;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{anyhow, Error};
use futures::Future;
use tokio::net::TcpListener;
use tokio::runtime;
use onion::core::client::User;
use onion::core::directory::Directory;
use onion::core::net::*;
use onion::core::relay::Relay;
use onion::packet::node::{Request, Response};
#[cfg(unix)]
use syslog::Facility;

use crate::node_config::*;

/// Run a future with the runtime specified by config.
fn run<F>(future: F, threads: Threads)
    where F: Future<Output = Result<(), Error>> + 'static
{
    if threads == Threads::N(1) {
        let runtime = runtime::Runtime::new().expect("Failed to create runtime");
        runtime.block_on(future).expect("Execution was terminated with error");
    } else {
        let mut builder = runtime::Builder::new_multi_thread();
        match threads {
            Threads::N(n) => { builder.worker_threads(n as usize); },
            Threads::Auto => { }, // builder will detect number of cores automatically
        }
        let runtime = builder
            .enable_all()
            .build()
            .expect("Failed to create runtime");
        runtime.block_on(future).expect("Execution was terminated with error");
    };
}

fn init_logger(log_type: LogType) {
    match log_type {
        LogType::Stderr => {
            let env = env_logger::Env::default()
                .filter_or("RUST_LOG", "info");
            env_logger::Builder::from_env(env)
                .init();
        },
        LogType::Stdout => {
            let env = env_logger::Env::default()
                .filter_or("RUST_LOG", "info");
            env_logger::Builder::from_env(env)
                .target(env_logger::fmt::Target::Stdout)
                .init();
        },
        #[cfg(unix)]
        LogType::Syslog => {
            syslog::init(Facility::LOG_USER, log::LevelFilter::Info, None)
                .expect("Failed to initialize syslog backend.");
        },
        LogType::None => { },
    }
}

/// Bind a TCP listener to the port of the node with given address.
async fn bind_listener(transport: &TcpTransport, address: Address) -> Result<(TcpListener, SocketAddr), Error> {
    let addr = transport.socket_addr(address)?;
    let listener = TcpListener::bind(&addr).await?;
    Ok((listener, addr))
}

async fn run_directory(network: NetworkConfig) -> Result<(), Error> {
    let transport = network.transport();
    let (listener, addr) = bind_listener(&transport, network.address_book().directory).await?;

    info!("Running directory on {}", addr);

    serve(listener, Arc::new(Directory::new())).await?;
    Ok(())
}

async fn run_relay(network: NetworkConfig, id: u32) -> Result<(), Error> {
    let transport = Arc::new(network.transport());
    let book = network.address_book();
    let (listener, addr) = bind_listener(&transport, book.relay(id)).await?;

    let relay = Arc::new(Relay::new(id, book, transport)?);
    info!("Relay {} public key: {}", id, relay.identity().public_key);

    // status requests are answered while the relay registers
    let server = tokio::spawn(serve(listener, relay.clone()));

    relay.register().await?;
    relay.serve().await;

    info!("Running relay {} on {}", id, addr);

    server.await??;
    Ok(())
}

async fn run_user(network: NetworkConfig, id: u32) -> Result<(), Error> {
    let transport = Arc::new(network.transport());
    let book = network.address_book();
    let (listener, addr) = bind_listener(&transport, book.user(id)).await?;

    info!("Running user {} on {}", id, addr);

    serve(listener, Arc::new(User::new(id, book, transport))).await?;
    Ok(())
}

async fn send_message(config: SendConfig) -> Result<(), Error> {
    let transport = config.network.transport();
    let address = config.network.address_book().user(config.user_id);
    let request = Request::SendMessage {
        message: config.message,
        destination_user_id: config.destination_user_id,
    };

    match send_request(&transport, address, request).await? {
        Response::Done => {
            info!("User {} sent message to user {}", config.user_id, config.destination_user_id);
            Ok(())
        },
        response => Err(anyhow!("Unexpected response from user {}: {:?}", config.user_id, response)),
    }
}

fn run_node(config: NodeConfig) {
    init_logger(config.log_type);

    for key in config.unused.keys() {
        warn!("Unused configuration key: {:?}", key);
    }

    let network = config.network;
    let id = config.id;
    let future = async move {
        match (config.role, id) {
            (Role::Directory, _) => run_directory(network).await,
            (Role::Relay, Some(id)) => run_relay(network, id).await,
            (Role::User, Some(id)) => run_user(network, id).await,
            (role, None) => Err(anyhow!("Id of the {:?} is not set", role)),
        }
    };

    run(future, config.threads);
}

fn main() {
    match cli_parse() {
        CliCommand::Run(config) => run_node(config),
        CliCommand::Send(config) => {
            init_logger(LogType::Stderr);
            run(send_message(config), Threads::N(1));
        },
    }
}
