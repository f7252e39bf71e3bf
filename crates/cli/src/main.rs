use clap::{Parser, Subcommand};
use percapita_api::{ApiClient, BatchItem, EnrollmentQuery, ReconciliationService};
use percapita_core::config::{api_base_url_from_env_value, bool_from_env_value};
use percapita_core::constants::{ENV_API_TOKEN, ENV_API_URL, ENV_USE_BATCH};
use percapita_core::{
    confirm_deletion, dropdown_options, CatalogKind, CatalogSeed, CoreConfig, EnrollmentDraft,
    EnrollmentPatch, EnrollmentStats, EnrollmentStatus, Period, ReconciliationInput,
};
use percapita_rut::{compute_check_char, format, sanitize_input, Rut};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "percapita")]
#[command(about = "Percapita enrollment management CLI")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Format a RUT for display (BODY-CHECK)
    FormatRut {
        /// Raw RUT as typed, punctuation allowed
        raw: String,
    },
    /// Check a RUT's check character
    ValidateRut {
        rut: String,
    },
    /// Compute the check character for a numeric body
    CheckChar {
        body: String,
    },
    /// Reconcile one RUN against the loaded extracts
    Reconcile {
        run: String,
        /// Inscription date (YYYY-MM-DD)
        fecha_inscripcion: String,
        /// Currently stored status
        #[arg(long)]
        estado: Option<EnrollmentStatus>,
        /// Enrollment id; when given, a changed status is written back
        #[arg(long)]
        update: Option<u64>,
    },
    /// Reconcile every enrollment of a period
    ReconcilePeriod {
        /// Month (1-12)
        month: u32,
        year: i32,
        /// Only enrollments currently in this status
        #[arg(long)]
        estado: Option<EnrollmentStatus>,
    },
    /// Show per-status counts for a period
    Stats {
        month: u32,
        year: i32,
    },
    /// Register a new enrollment
    Register {
        run: String,
        /// Full name
        nombre: String,
        /// Request date (YYYY-MM-DD)
        fecha_solicitud: String,
        /// Inscription date (YYYY-MM-DD)
        #[arg(long)]
        fecha_inscripcion: Option<String>,
        /// Establishment name
        #[arg(long)]
        establecimiento: Option<String>,
    },
    /// Manually set an enrollment's status
    SetStatus {
        id: u64,
        estado: EnrollmentStatus,
        /// Mark the record as reviewed
        #[arg(long)]
        revisado: bool,
        /// Replace the record's notes
        #[arg(long)]
        observaciones: Option<String>,
        /// Correct the inscription date (YYYY-MM-DD); the period follows it
        #[arg(long)]
        fecha_inscripcion: Option<String>,
    },
    /// Delete an enrollment after retyping its RUN
    Delete {
        id: u64,
        /// The enrollment's RUN, retyped as confirmation
        #[arg(long)]
        confirm: String,
    },
    /// List active catalog options of one kind
    Catalog {
        /// ETNIA, NACIONALIDAD, SECTOR, SUBSECTOR or ESTABLECIMIENTO
        kind: CatalogKind,
    },
    /// Validate a catalog seed file
    CheckCatalog {
        path: PathBuf,
    },
    /// Upload every entry of a catalog seed file
    PushCatalog {
        path: PathBuf,
    },
}

fn config_from_env() -> anyhow::Result<CoreConfig> {
    let api_base_url = api_base_url_from_env_value(std::env::var(ENV_API_URL).ok());
    let api_token = std::env::var(ENV_API_TOKEN).ok();
    let use_batch = bool_from_env_value(ENV_USE_BATCH, std::env::var(ENV_USE_BATCH).ok(), true)?;
    Ok(CoreConfig::new(api_base_url, api_token, use_batch)?)
}

fn override_patch(
    estado: EnrollmentStatus,
    revisado: bool,
    observaciones: Option<&str>,
    fecha_inscripcion: Option<&str>,
) -> anyhow::Result<EnrollmentPatch> {
    let mut patch = EnrollmentPatch::status(estado);
    if revisado {
        patch = patch.with_revisado(true);
    }
    if let Some(observaciones) = observaciones {
        patch = patch.with_observaciones(observaciones);
    }
    if let Some(date) = fecha_inscripcion {
        patch = patch.with_inscription_date(date)?;
    }
    Ok(patch)
}

fn api_client() -> anyhow::Result<(ApiClient, CoreConfig)> {
    let config = config_from_env()?;
    Ok((ApiClient::new(&config)?, config))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("percapita_api=warn".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::FormatRut { raw }) => {
            println!("{}", format(&sanitize_input(&raw)));
        }
        Some(Commands::ValidateRut { rut }) => match Rut::parse(&rut) {
            Ok(rut) => println!("{rut} is valid"),
            Err(e) => {
                eprintln!("{rut}: {e}");
                std::process::exit(1);
            }
        },
        Some(Commands::CheckChar { body }) => match compute_check_char(body.trim()) {
            Some(check) => println!("{}-{}", body.trim(), check),
            None => anyhow::bail!("body must contain digits only"),
        },
        Some(Commands::Reconcile {
            run,
            fecha_inscripcion,
            estado,
            update,
        }) => {
            let (client, config) = api_client()?;
            let service = ReconciliationService::new(client, config.use_batch_endpoint());
            let mut input = ReconciliationInput::new(run, Some(fecha_inscripcion));
            input.estado_actual = estado;

            match update {
                Some(id) => {
                    let reconciled = service.reconcile_and_update(id, &input).await;
                    println!("{}", serde_json::to_string_pretty(&reconciled.outcome)?);
                    if reconciled.actualizado {
                        println!("Updated enrollment {id} to {}", reconciled.outcome.estado);
                    }
                }
                None => {
                    let outcome = service.reconcile(&input).await;
                    println!("{}", serde_json::to_string_pretty(&outcome)?);
                }
            }
        }
        Some(Commands::ReconcilePeriod {
            month,
            year,
            estado,
        }) => {
            let (client, config) = api_client()?;
            let mut query = EnrollmentQuery::for_period(Period::new(year, month)?);
            query.estado = estado;

            let page = client.list_enrollments(&query).await?;
            let items: Vec<BatchItem> = page
                .usuarios
                .iter()
                .filter_map(BatchItem::from_enrollment)
                .collect();

            let service = ReconciliationService::new(client, config.use_batch_endpoint());
            let report = service.reconcile_batch(&items).await;
            for result in &report.resultados {
                let marker = if result.actualizado { "*" } else { " " };
                println!("{marker} {:>8}  {}", result.id, result.estado.label());
            }
            println!(
                "Processed: {}, updated: {}{}",
                report.total_procesados,
                report.total_actualizados,
                if report.per_record { " (per record)" } else { "" }
            );
        }
        Some(Commands::Stats { month, year }) => {
            let (client, _) = api_client()?;
            let period = Period::new(year, month)?;
            let page = client
                .list_enrollments(&EnrollmentQuery::for_period(period))
                .await?;
            let stats = EnrollmentStats::from_enrollments(&page.usuarios);

            println!("{}", period.label());
            println!("Total: {}", stats.total);
            for status in EnrollmentStatus::ALL {
                println!("  {:<12} {}", status.label(), stats.count(status));
            }
        }
        Some(Commands::Register {
            run,
            nombre,
            fecha_solicitud,
            fecha_inscripcion,
            establecimiento,
        }) => {
            let draft = EnrollmentDraft {
                run,
                nombre_completo: nombre,
                fecha_solicitud,
                fecha_inscripcion,
                establecimiento,
                ..EnrollmentDraft::default()
            };
            let enrollment = draft.validate()?;
            let (client, _) = api_client()?;
            let created = client.create_enrollment(&enrollment).await?;
            match created.id {
                Some(id) => println!("Registered {} with id {id}", created.run),
                None => println!("Registered {}", created.run),
            }
        }
        Some(Commands::SetStatus {
            id,
            estado,
            revisado,
            observaciones,
            fecha_inscripcion,
        }) => {
            let patch = override_patch(
                estado,
                revisado,
                observaciones.as_deref(),
                fecha_inscripcion.as_deref(),
            )?;
            let (client, _) = api_client()?;
            let stored = client.update_enrollment(id, &patch).await?;
            println!(
                "Enrollment {id} ({}) set to {}",
                stored.display_name(),
                stored.estado.label()
            );
        }
        Some(Commands::Delete { id, confirm }) => {
            let (client, _) = api_client()?;
            let stored = client.get_enrollment(id).await?;
            let confirmed = confirm_deletion(&stored, &confirm)?;
            client.delete_enrollment(confirmed).await?;
            println!("Deleted enrollment {id} ({})", stored.display_name());
        }
        Some(Commands::Catalog { kind }) => {
            let (client, _) = api_client()?;
            let items = client.list_catalog(kind).await?;
            for item in dropdown_options(&items, kind) {
                match &item.codigo {
                    Some(codigo) => println!("{:>3}  {} ({codigo})", item.orden, item.nombre),
                    None => println!("{:>3}  {}", item.orden, item.nombre),
                }
            }
        }
        Some(Commands::CheckCatalog { path }) => match CatalogSeed::load(&path) {
            Ok(seed) => {
                for kind in CatalogKind::ALL {
                    println!("{:<16} {}", kind, seed.count(kind));
                }
                println!("Total: {}", seed.len());
            }
            Err(e) => {
                eprintln!("Error in {}: {}", path.display(), e);
                std::process::exit(1);
            }
        },
        Some(Commands::PushCatalog { path }) => {
            let seed = CatalogSeed::load(&path)?;
            let (client, _) = api_client()?;
            for item in seed.items() {
                client.create_catalog_item(item).await?;
            }
            println!("Uploaded {} catalog entries", seed.len());
        }
        None => {
            println!("Use 'percapita --help' for commands");
        }
    }

    Ok(())
}
