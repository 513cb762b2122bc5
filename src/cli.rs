use crate::{
    Error, Result,
    api::{
        Action, CreateAiApi, HttpApiClient, ProjectRequest, QueryRequest,
        ResponseFormat, SearchParams, SearchRequest,
    },
    config::{Config, Credentials},
    probe::{self, Endpoint},
    stream::StreamClient,
};
use clap::{Args, Parser, Subcommand};
use std::io::{self, Write};
use tracing::info;

#[derive(Debug, Parser)]
#[command(
    name = "createai-probe",
    version,
    about = "Diagnostic client for the CreateAI query, search and streaming APIs"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Stream an answer over the WebSocket endpoint until <EOS>
    Stream(StreamArgs),
    /// Send one non-streaming query to /query
    Query(QueryArgs),
    /// Send a raw search to /search
    Search(SearchArgs),
    /// Send a query through a project via /project
    Project(ProjectArgs),
    /// Run document-filtering scenarios against /query and /search
    Probe(ProbeArgs),
}

#[derive(Debug, Args)]
pub struct StreamArgs {
    pub query: String,
    #[arg(long)]
    pub session_id: Option<String>,
    #[arg(long)]
    pub system_prompt: Option<String>,
    #[arg(long)]
    pub temperature: Option<f32>,
}

#[derive(Debug, Args)]
pub struct QueryArgs {
    pub query: String,
    #[arg(long)]
    pub session_id: Option<String>,
    /// Ask for a JSON-formatted answer
    #[arg(long)]
    pub json: bool,
    /// Source name to look for in the answer
    #[arg(long)]
    pub target: Option<String>,
}

#[derive(Debug, Args)]
pub struct SearchArgs {
    pub query: String,
    /// Restrict to these source names (repeatable)
    #[arg(long = "source-name")]
    pub source_names: Vec<String>,
    /// Raw filter expression, e.g. "material_id == '1005'"
    #[arg(long)]
    pub expr: Option<String>,
    #[arg(long, default_value_t = 5)]
    pub top_k: u32,
    #[arg(long)]
    pub collection: Option<String>,
}

#[derive(Debug, Args)]
pub struct ProjectArgs {
    pub query: String,
    #[arg(long, env = "CREATE_AI_PROJECT_ID")]
    pub project_id: String,
}

#[derive(Debug, Args)]
pub struct ProbeArgs {
    /// Scenario names to run; all when omitted
    pub scenarios: Vec<String>,
    /// List scenario names and exit
    #[arg(long)]
    pub list: bool,
}

pub async fn run(cli: Cli, config: Config) -> Result<()> {
    let mut stdout = io::stdout();

    if let Command::Probe(ProbeArgs { list: true, .. }) = &cli.command {
        for scenario in scenarios(&config) {
            writeln!(stdout, "{:<22} {}", scenario.name, scenario.description)?;
        }
        return Ok(());
    }

    let credentials = Credentials::from_env(&config.api.token_env)?;
    info!("Using token {}", credentials.redacted());

    match cli.command {
        Command::Stream(args) => {
            let mut request = QueryRequest::new(args.query, &config.model).streaming();
            if let Some(session_id) = args.session_id {
                request = request.with_session_id(session_id);
            }
            if let Some(system_prompt) = args.system_prompt {
                request = request.with_system_prompt(system_prompt);
            }
            if let Some(temperature) = args.temperature {
                request = request.with_temperature(temperature);
            }

            let client = StreamClient::new(&config.api.ws_url, &config.stream, credentials);
            client.run(&request, &mut stdout).await?;
            writeln!(stdout)?;
        }
        Command::Query(args) => {
            let format = if args.json {
                ResponseFormat::json()
            } else {
                ResponseFormat::text()
            };
            let mut request = QueryRequest::new(args.query, &config.model)
                .override_params()
                .with_response_format(format);
            if let Some(session_id) = args.session_id {
                request = request.with_session_id(session_id);
            }

            let api = HttpApiClient::new(&config.api, credentials)?;
            let reply = api.query(&request).await?;
            probe::report_reply(&mut stdout, Endpoint::Query, reply, args.target.as_deref(), &[])?;
        }
        Command::Search(args) => {
            let request = search_request(args);
            let api = HttpApiClient::new(&config.api, credentials)?;
            let reply = api.search(&request).await?;
            probe::report_reply(&mut stdout, Endpoint::Search, reply, None, &[])?;
        }
        Command::Project(args) => {
            let query = QueryRequest::new(args.query, &config.model).override_params();
            let request = ProjectRequest::new(args.project_id, query);
            let api = HttpApiClient::new(&config.api, credentials)?;
            let reply = api.project(&request).await?;
            probe::report_raw_reply(&mut stdout, &reply)?;
        }
        Command::Probe(args) => {
            let selected = probe::select(&scenarios(&config), &args.scenarios)?;
            let api = HttpApiClient::new(&config.api, credentials)?;
            probe::run_all(&api, &selected, &config.model, &mut stdout).await?;
        }
    }

    Ok(())
}

/// Headline for a failed run. Wire failures point at the service, anything
/// else at local setup.
pub fn failure_context(error: &Error) -> &'static str {
    if error.is_transport() {
        "Could not complete the exchange with CreateAI"
    } else {
        "createai-probe could not run"
    }
}

fn scenarios(config: &Config) -> Vec<probe::Scenario> {
    if config.scenarios.is_empty() {
        probe::builtin_scenarios()
    } else {
        config.scenarios.clone()
    }
}

pub fn search_request(args: SearchArgs) -> SearchRequest {
    let output_fields: Vec<String> = ["content", "source_name", "material_id", "metadata"]
        .iter()
        .map(|f| f.to_string())
        .collect();

    let search_params = (!args.source_names.is_empty()).then(|| SearchParams {
        top_k: args.top_k,
        reranker: true,
        retrieval_type: None,
        output_fields: output_fields.clone(),
        expr: None,
        source_name: None,
        source_names: Some(args.source_names.clone()),
        collection: None,
    });

    SearchRequest {
        action: Action::Search,
        query: args.query,
        collection: args.collection,
        expr: args.expr,
        top_k: args.top_k,
        output_fields,
        search_params,
    }
}
