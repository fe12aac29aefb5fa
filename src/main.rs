mod charm;
mod commands;
mod core;
mod ui;
mod upstream;
mod utils;

use clap::{Parser, Subcommand};
use crate::core::config::RailEnv;
use crate::core::context::RunContext;
use crate::core::error::{RailError, print_error};
use crate::upstream::packages::{DEFAULT_VERSION_SOURCE, PackageKind};
use std::path::PathBuf;

/// Build, publish, promote and upstream-sync orchestration for charms,
/// bundles, snaps and debs
#[derive(Parser)]
#[command(name = "ckrail")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
#[command(styles = get_styles())]
struct Cli {
  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  // ============================================================================
  // Charm store
  // ============================================================================
  /// Build, publish and promote charms and bundles
  #[command(subcommand)]
  Charm(CharmCommands),

  // ============================================================================
  // Stable releases
  // ============================================================================
  /// Cut and tag stable branches
  #[command(subcommand)]
  Release(ReleaseCommands),

  // ============================================================================
  // Upstream sync
  // ============================================================================
  /// Keep downstream repositories in step with upstream
  #[command(subcommand)]
  Sync(SyncCommands),
}

#[derive(Subcommand)]
enum CharmCommands {
  /// Pull layer and interface sources
  PullLayers {
    /// Charm layer index
    #[arg(long)]
    layer_index: String,
    /// List of layers in YAML format
    #[arg(long)]
    layer_list: PathBuf,
    /// Branch of layers to check out
    #[arg(long, default_value = "master")]
    layer_branch: String,
    /// Attempts per layer
    #[arg(long, default_value_t = 15)]
    retries: u32,
    /// Seconds between attempts
    #[arg(long, default_value_t = 60)]
    timeout: u64,
  },

  /// Build charms and bundles, push them and promote to a channel
  Build {
    /// Path to the charm list YAML
    #[arg(long)]
    charm_list: PathBuf,
    /// List of layers in YAML format
    #[arg(long)]
    layer_list: PathBuf,
    /// Charm layer index
    #[arg(long)]
    layer_index: String,
    /// YAML spec of resource keys and file names
    #[arg(long)]
    resource_spec: PathBuf,
    /// List of bundles in YAML format
    #[arg(long)]
    bundle_list: PathBuf,
    /// Only build entries carrying one of these tags
    #[arg(long, required = true, value_delimiter = ',')]
    filter_by_tag: Vec<String>,
    /// Git branch to build charms from
    #[arg(long, default_value = "master")]
    charm_branch: String,
    /// Git branch to pull layers and interfaces from
    #[arg(long, default_value = "master")]
    layer_branch: String,
    /// Repository of the bundle builder
    #[arg(long, default_value = crate::charm::build::DEFAULT_BUNDLE_REPO)]
    bundle_repo: String,
    /// Channel to promote to
    #[arg(long, default_value = "edge")]
    to_channel: String,
    /// Log what would be built without building
    #[arg(long)]
    dry_run: bool,
    /// Output results in JSON format
    #[arg(long)]
    json: bool,
  },

  /// Re-release what is published at one channel onto another
  Promote {
    /// Path to the charm list YAML
    #[arg(long)]
    charm_list: PathBuf,
    /// Channel to publish from
    #[arg(long)]
    from_channel: String,
    /// Channel to publish to
    #[arg(long)]
    to_channel: String,
    /// Only promote entries carrying one of these tags
    #[arg(long, value_delimiter = ',')]
    filter_by_tag: Vec<String>,
    /// Resolve what would be released without releasing
    #[arg(long)]
    dry_run: bool,
    /// Output the promotion plans in JSON format
    #[arg(long)]
    json: bool,
  },

  /// Build resources with a builder script and attach them
  Resource {
    /// Charm store entity (ie. cs:~containers/flannel)
    #[arg(long)]
    charm_entity: String,
    /// Channel to query the entity at
    #[arg(long, default_value = "unpublished")]
    channel: String,
    /// Path of the resource builder
    #[arg(long)]
    builder: PathBuf,
    /// Where the builder writes resources
    #[arg(long)]
    out_path: PathBuf,
    /// YAML spec of resource keys and file names
    #[arg(long)]
    resource_spec: PathBuf,
  },
}

#[derive(Subcommand)]
enum ReleaseCommands {
  /// Merge master into stable for every repository needing it
  CutStable {
    /// Path to the layer list
    #[arg(long)]
    layer_list: PathBuf,
    /// Path to the charm list
    #[arg(long)]
    charm_list: PathBuf,
    /// Path to additional repositories that need a stable branch
    #[arg(long)]
    ancillary_list: PathBuf,
    /// Only release entries carrying one of these tags
    #[arg(long, value_delimiter = ',')]
    filter_by_tag: Vec<String>,
    /// Log what would be released without cloning
    #[arg(long)]
    dry_run: bool,
    /// Output results in JSON format
    #[arg(long)]
    json: bool,
  },

  /// Tag stable branches with the bundle revision they shipped in
  TagStable {
    /// Path to the layer list
    #[arg(long)]
    layer_list: PathBuf,
    /// Path to the charm list
    #[arg(long)]
    charm_list: PathBuf,
    /// Kubernetes version this bundle provides
    #[arg(long)]
    k8s_version: String,
    /// Bundle revision to tag stable against
    #[arg(long)]
    bundle_revision: String,
    /// Only tag entries carrying one of these tags
    #[arg(long, value_delimiter = ',')]
    filter_by_tag: Vec<String>,
    /// Use the bugfix tag format (`{version}+{revision}`)
    #[arg(long)]
    bugfix: bool,
    /// Log what would be tagged without cloning
    #[arg(long)]
    dry_run: bool,
    /// Output results in JSON format
    #[arg(long)]
    json: bool,
    /// Exit with code 3 when any repository failed
    #[arg(long)]
    strict: bool,
  },
}

#[derive(Subcommand)]
enum SyncCommands {
  /// Merge upstream master into every downstream fork
  Forks {
    /// Path to the layer list
    #[arg(long)]
    layer_list: PathBuf,
    /// Path to the charm list
    #[arg(long)]
    charm_list: PathBuf,
    /// Parallel workers (default: available processing units)
    #[arg(long)]
    jobs: Option<usize>,
    /// List the queue without syncing
    #[arg(long)]
    dry_run: bool,
    /// Output results in JSON format
    #[arg(long)]
    json: bool,
    /// Exit with code 3 when any fork failed
    #[arg(long)]
    strict: bool,
  },

  /// Copy missing upstream release tags downstream
  Tags {
    /// Upstream repository
    #[arg(long)]
    upstream: String,
    /// Downstream repository
    #[arg(long)]
    downstream: String,
    /// Oldest version to consider
    #[arg(long, default_value = crate::upstream::tags::DEFAULT_STARTING_SEMVER)]
    starting_semver: String,
    /// List missing tags without pushing
    #[arg(long)]
    dry_run: bool,
    /// Output results in JSON format
    #[arg(long)]
    json: bool,
    /// Exit with code 3 when any tag failed
    #[arg(long)]
    strict: bool,
  },

  /// Create missing per-version snap branches
  Snaps {
    #[command(flatten)]
    args: PackageArgs,
  },

  /// Create missing per-series deb branches
  Debs {
    #[command(flatten)]
    args: PackageArgs,
  },
}

#[derive(clap::Args)]
struct PackageArgs {
  /// Path to the package repository list
  #[arg(long)]
  package_list: PathBuf,
  /// Repository whose release tags define the versions
  #[arg(long, default_value = DEFAULT_VERSION_SOURCE)]
  upstream: String,
  /// Oldest version to consider
  #[arg(long, default_value = crate::upstream::tags::DEFAULT_STARTING_SEMVER)]
  starting_semver: String,
  /// Only sync entries carrying one of these tags
  #[arg(long, value_delimiter = ',')]
  filter_by_tag: Vec<String>,
  /// List missing branches without creating them
  #[arg(long)]
  dry_run: bool,
  /// Output results in JSON format
  #[arg(long)]
  json: bool,
  /// Exit with code 3 when any repository failed
  #[arg(long)]
  strict: bool,
}

impl From<PackageArgs> for commands::sync::PackagesParams {
  fn from(args: PackageArgs) -> Self {
    Self {
      package_list: args.package_list,
      upstream: args.upstream,
      starting_semver: args.starting_semver,
      filter_by_tag: args.filter_by_tag,
      dry_run: args.dry_run,
      json: args.json,
      strict: args.strict,
    }
  }
}

fn get_styles() -> clap::builder::Styles {
  clap::builder::Styles::styled()
    .usage(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .header(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .literal(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))))
    .invalid(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .error(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .valid(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))),
    )
    .placeholder(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::White))))
}

fn main() {
  let cli = Cli::parse();
  ui::logging::init();

  // Read the environment once; nothing below this point touches it
  let env = match RailEnv::from_env() {
    Ok(env) => env,
    Err(e) => handle_error(e),
  };
  let ctx = RunContext::system(env);

  let result = match cli.command {
    Commands::Charm(charm_cmd) => match charm_cmd {
      CharmCommands::PullLayers {
        layer_index,
        layer_list,
        layer_branch,
        retries,
        timeout,
      } => commands::run_pull_layers(
        &ctx,
        commands::charm::PullLayersParams {
          layer_index,
          layer_list,
          layer_branch,
          retries,
          timeout,
        },
      ),
      CharmCommands::Build {
        charm_list,
        layer_list,
        layer_index,
        resource_spec,
        bundle_list,
        filter_by_tag,
        charm_branch,
        layer_branch,
        bundle_repo,
        to_channel,
        dry_run,
        json,
      } => commands::run_build(
        &ctx,
        commands::charm::BuildParams {
          charm_list,
          layer_list,
          layer_index,
          resource_spec,
          bundle_list,
          filter_by_tag,
          charm_branch,
          layer_branch,
          bundle_repo,
          to_channel,
          dry_run,
          json,
        },
      ),
      CharmCommands::Promote {
        charm_list,
        from_channel,
        to_channel,
        filter_by_tag,
        dry_run,
        json,
      } => commands::run_promote(
        &ctx,
        commands::charm::PromoteParams {
          charm_list,
          from_channel,
          to_channel,
          filter_by_tag,
          dry_run,
          json,
        },
      ),
      CharmCommands::Resource {
        charm_entity,
        channel,
        builder,
        out_path,
        resource_spec,
      } => commands::run_resource(
        &ctx,
        commands::charm::ResourceParams {
          charm_entity,
          channel,
          builder,
          out_path,
          resource_spec,
        },
      ),
    },

    Commands::Release(release_cmd) => match release_cmd {
      ReleaseCommands::CutStable {
        layer_list,
        charm_list,
        ancillary_list,
        filter_by_tag,
        dry_run,
        json,
      } => commands::run_cut_stable(
        &ctx,
        commands::release::CutStableParams {
          layer_list,
          charm_list,
          ancillary_list,
          filter_by_tag,
          dry_run,
          json,
        },
      ),
      ReleaseCommands::TagStable {
        layer_list,
        charm_list,
        k8s_version,
        bundle_revision,
        filter_by_tag,
        bugfix,
        dry_run,
        json,
        strict,
      } => commands::run_tag_stable(
        &ctx,
        commands::release::TagStableParams {
          layer_list,
          charm_list,
          k8s_version,
          bundle_revision,
          filter_by_tag,
          bugfix,
          dry_run,
          json,
          strict,
        },
      ),
    },

    Commands::Sync(sync_cmd) => match sync_cmd {
      SyncCommands::Forks {
        layer_list,
        charm_list,
        jobs,
        dry_run,
        json,
        strict,
      } => commands::run_sync_forks(
        &ctx,
        commands::sync::ForksParams {
          layer_list,
          charm_list,
          jobs,
          dry_run,
          json,
          strict,
        },
      ),
      SyncCommands::Tags {
        upstream,
        downstream,
        starting_semver,
        dry_run,
        json,
        strict,
      } => commands::run_sync_tags(
        &ctx,
        commands::sync::TagsParams {
          upstream,
          downstream,
          starting_semver,
          dry_run,
          json,
          strict,
        },
      ),
      SyncCommands::Snaps { args } => commands::run_sync_packages(&ctx, PackageKind::Snap, args.into()),
      SyncCommands::Debs { args } => commands::run_sync_packages(&ctx, PackageKind::Deb, args.into()),
    },
  };

  if let Err(err) = result {
    handle_error(err);
  }
}

fn handle_error(err: RailError) -> ! {
  print_error(&err);
  std::process::exit(err.exit_code().as_i32());
}
