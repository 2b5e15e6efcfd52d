use structopt::StructOpt;

#[derive(StructOpt, Debug, Clone, Default)]
pub struct Options {
    /// Config filename
    #[structopt(name = "config", short = "f", long)]
    pub cfg_name: Option<String>,

    /// JSON file seeding the host configuration shared state
    #[structopt(name = "configuration", short = "c", long)]
    pub configuration_file: Option<String>,

    /// Privacy status override, one of optedin, optedout, optunknown
    #[structopt(name = "privacy", long)]
    pub privacy: Option<String>,

    /// Log level override, e.g. debug
    #[structopt(name = "log-level", long)]
    pub log_level: Option<String>,
}
