use std::net::IpAddr;
use std::num::ParseIntError;
use std::str::FromStr;
use std::collections::HashMap;
use std::time::Duration;

use config::{Config, File as CfgFile, FileFormat as CfgFileFormat};
use serde::{de, Deserialize, Deserializer};
use serde_yaml::Value;
use clap::{Arg, ArgMatches, builder::PossibleValue, Command, ValueEnum, value_parser};
use onion::core::net::*;

/// Default host nodes listen on and connect to.
const DEFAULT_HOST: &str = "127.0.0.1";

/// Config for threading.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Deserialize)]
pub enum Threads {
    /// Detect number of threads automatically by the number of CPU cores.
    Auto,
    /// Exact number of threads.
    N(u16)
}

impl FromStr for Threads {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "auto" {
            Ok(Threads::Auto)
        } else {
            u16::from_str(s).map(Threads::N)
        }
    }
}

#[cfg(unix)]
/// Specifies where to write logs.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Deserialize)]
pub enum LogType {
    Stderr,
    Stdout,
    Syslog,
    None,
}

#[cfg(not(unix))]
/// Specifies where to write logs.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Deserialize)]
pub enum LogType {
    Stderr,
    Stdout,
    None,
}

impl ValueEnum for LogType {
    fn value_variants<'a>() -> &'a [Self] {
        use self::LogType::*;
        #[cfg(unix)]
        return &[Stderr, Stdout, Syslog, None];
        #[cfg(not(unix))]
        return &[Stderr, Stdout, None];
    }

    fn to_possible_value<'a>(&self) -> Option<PossibleValue> {
        use self::LogType::*;
        Some(match self {
            Stderr => PossibleValue::new("Stderr"),
            Stdout => PossibleValue::new("Stdout"),
            #[cfg(unix)]
            Syslog => PossibleValue::new("Syslog"),
            None => PossibleValue::new("None")
        })
    }
}

/// Kind of node to run.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Registry of relays.
    Directory,
    /// Relay that peels one layer and forwards the rest.
    Relay,
    /// User that sends and receives messages.
    User,
}

impl ValueEnum for Role {
    fn value_variants<'a>() -> &'a [Self] {
        use self::Role::*;
        &[Directory, Relay, User]
    }

    fn to_possible_value<'a>(&self) -> Option<PossibleValue> {
        use self::Role::*;
        Some(match self {
            Directory => PossibleValue::new("directory"),
            Relay => PossibleValue::new("relay"),
            User => PossibleValue::new("user"),
        })
    }
}

fn de_threads<'de, D>(deserializer: D) -> Result<Threads, D::Error> where D: Deserializer<'de> {
    let s = String::deserialize(deserializer)?;

    Threads::from_str(&s)
        .map_err(|e| de::Error::custom(format!("threads: {:?}", e)))
}

/// Ports nodes of the overlay listen on, shared by every node of one host.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Deserialize)]
pub struct NetworkConfig {
    /// IP address nodes listen on.
    pub host: IpAddr,
    /// Port of the directory.
    #[serde(rename = "directory-port")]
    pub directory_port: u32,
    /// Relay `n` listens on this port plus `n`.
    #[serde(rename = "base-relay-port")]
    pub base_relay_port: u32,
    /// User `n` listens on this port plus `n`.
    #[serde(rename = "base-user-port")]
    pub base_user_port: u32,
    /// Seconds to wait for a response from another node.
    #[serde(rename = "request-timeout")]
    pub request_timeout: u64,
}

impl NetworkConfig {
    /// Where the nodes can be found.
    pub fn address_book(&self) -> AddressBook {
        AddressBook {
            directory: Address(self.directory_port),
            base_relay: self.base_relay_port,
            base_user: self.base_user_port,
        }
    }

    /// Transport to reach other nodes.
    pub fn transport(&self) -> TcpTransport {
        TcpTransport::new(self.host, Duration::from_secs(self.request_timeout))
    }
}

/// Config of a node parsed either from command line arguments or from a
/// config file.
#[derive(Clone, Debug, Deserialize)]
pub struct NodeConfig {
    /// Kind of the node.
    pub role: Role,
    /// Id of a relay or a user. Not used by the directory.
    #[serde(default)]
    pub id: Option<u32>,
    /// Addresses of the overlay.
    #[serde(flatten)]
    pub network: NetworkConfig,
    /// Number of threads for execution.
    #[serde(deserialize_with = "de_threads")]
    pub threads: Threads,
    /// Specifies where to write logs.
    #[serde(rename = "log-type")]
    pub log_type: LogType,
    /// Unused fields while parsing config file
    #[serde(flatten)]
    pub unused: HashMap<String, Value>,
}

/// Request to a running user node to send a message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SendConfig {
    /// Addresses of the overlay.
    pub network: NetworkConfig,
    /// Id of the user node that sends the message.
    pub user_id: u32,
    /// Id of the user that receives the message.
    pub destination_user_id: u32,
    /// Text of the message.
    pub message: String,
}

/// What the command line asks to do.
#[derive(Clone, Debug)]
pub enum CliCommand {
    /// Run a node until it fails.
    Run(NodeConfig),
    /// Ask a user node to send a message and exit.
    Send(SendConfig),
}

fn network_args() -> Vec<Arg> {
    vec![
        Arg::new("host")
            .long("host")
            .help("IP address nodes listen on")
            .num_args(1)
            .value_parser(value_parser!(IpAddr))
            .env("ONION_HOST")
            .default_value(DEFAULT_HOST),
        Arg::new("directory-port")
            .long("directory-port")
            .help("Port of the directory")
            .num_args(1)
            .value_parser(value_parser!(u32))
            .default_value("8080"),
        Arg::new("base-relay-port")
            .long("base-relay-port")
            .help("Relay with id N listens on this port plus N")
            .num_args(1)
            .value_parser(value_parser!(u32))
            .default_value("4000"),
        Arg::new("base-user-port")
            .long("base-user-port")
            .help("User with id N listens on this port plus N")
            .num_args(1)
            .value_parser(value_parser!(u32))
            .default_value("3000"),
        Arg::new("request-timeout")
            .long("request-timeout")
            .help("Seconds to wait for a response from another node")
            .num_args(1)
            .value_parser(value_parser!(u64))
            .default_value("10"),
    ]
}

fn app() -> Command {
    Command::new(crate_name!())
        .version(crate_version!())
        .about(crate_description!())
        .args_conflicts_with_subcommands(true)
        .subcommand_negates_reqs(true)
        .subcommand(Command::new("config")
            .arg(Arg::new("cfg-file")
                .index(1)
                .help("Load settings from saved config file. \
                    Config file format is YAML")
                .num_args(1)
                .required(true)))
        .subcommand(Command::new("send")
            .about("Ask a running user node to send a message")
            .arg(Arg::new("user-id")
                .short('u')
                .long("user-id")
                .help("Id of the user node that sends the message")
                .num_args(1)
                .value_parser(value_parser!(u32))
                .required(true))
            .arg(Arg::new("to")
                .short('t')
                .long("to")
                .help("Id of the user that receives the message")
                .num_args(1)
                .value_parser(value_parser!(u32))
                .required(true))
            .arg(Arg::new("message")
                .index(1)
                .help("Text of the message")
                .num_args(1)
                .required(true))
            .args(network_args()))
        // here go args without subcommands
        .arg(Arg::new("role")
            .short('r')
            .long("role")
            .help("Kind of node to run")
            .num_args(1)
            .value_parser(value_parser!(Role))
            .required(true))
        .arg(Arg::new("id")
            .short('i')
            .long("id")
            .help("Id of the relay or the user")
            .num_args(1)
            .value_parser(value_parser!(u32))
            .required_if_eq_any([("role", "relay"), ("role", "user")]))
        .args(network_args())
        .arg(Arg::new("threads")
            .short('j')
            .long("threads")
            .help("Number of threads to use. The value 'auto' means that the \
                   number of threads will be determined automatically by the \
                   number of CPU cores")
            .num_args(1)
            .value_parser(value_parser!(Threads))
            .default_value("1"))
        .arg(Arg::new("log-type")
            .short('l')
            .long("log-type")
            .help("Where to write logs")
            .num_args(1)
            .value_parser(value_parser!(LogType))
            .default_value("Stderr"))
}

/// Parse command line arguments.
pub fn cli_parse() -> CliCommand {
    let matches = app().get_matches();

    match matches.subcommand() {
        Some(("config", m)) => CliCommand::Run(run_config(m)),
        Some(("send", m)) => CliCommand::Send(run_send(m)),
        _ => CliCommand::Run(run_args(&matches)),
    }
}

/// Parse settings from a saved file.
fn parse_config(config_path: &str) -> NodeConfig {
    let config_builder = Config::builder()
        .set_default("host", DEFAULT_HOST).expect("Can't set default value for `host`")
        .set_default("directory-port", i64::from(DEFAULT_DIRECTORY_ADDRESS)).expect("Can't set default value for `directory-port`")
        .set_default("base-relay-port", i64::from(DEFAULT_BASE_RELAY_ADDRESS)).expect("Can't set default value for `base-relay-port`")
        .set_default("base-user-port", i64::from(DEFAULT_BASE_USER_ADDRESS)).expect("Can't set default value for `base-user-port`")
        .set_default("request-timeout", DEFAULT_REQUEST_TIMEOUT.as_secs() as i64).expect("Can't set default value for `request-timeout`")
        .set_default("log-type", "Stderr").expect("Can't set default value for `log-type`")
        .set_default("threads", "1").expect("Can't set default value for `threads`")
        .add_source(CfgFile::new(config_path, CfgFileFormat::Yaml));

    let config_file = match config_builder.build() {
        Ok(cfg) => cfg,
        Err(e) => panic!("Can't build config file {}", e),
    };

    let config: NodeConfig = config_file.try_deserialize().expect("Can't deserialize config");

    if config.role != Role::Directory && config.id.is_none() {
        panic!("Can't deserialize config: 'id' is not set for {:?}", config.role);
    }

    config
}

fn run_config(matches: &ArgMatches) -> NodeConfig {
    let config_path = matches.get_one::<String>("cfg-file").unwrap();

    parse_config(config_path)
}

fn network_config(matches: &ArgMatches) -> NetworkConfig {
    NetworkConfig {
        host: matches.get_one("host").copied().unwrap(),
        directory_port: matches.get_one("directory-port").copied().unwrap(),
        base_relay_port: matches.get_one("base-relay-port").copied().unwrap(),
        base_user_port: matches.get_one("base-user-port").copied().unwrap(),
        request_timeout: matches.get_one("request-timeout").copied().unwrap(),
    }
}

fn run_send(matches: &ArgMatches) -> SendConfig {
    SendConfig {
        network: network_config(matches),
        user_id: matches.get_one("user-id").copied().unwrap(),
        destination_user_id: matches.get_one("to").copied().unwrap(),
        message: matches.get_one::<String>("message").cloned().unwrap(),
    }
}

fn run_args(matches: &ArgMatches) -> NodeConfig {
    let role = matches.get_one("role").copied().unwrap();

    let id = matches.get_one("id").copied();

    let network = network_config(matches);

    let threads = matches.get_one("threads").copied().unwrap();

    let log_type = matches.get_one("log-type").copied().unwrap();

    NodeConfig {
        role,
        id,
        network,
        threads,
        log_type,
        unused: HashMap::new(),
    }
}
