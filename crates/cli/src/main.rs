use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use ward_core::config::{
    patient_data_dir_from_env_value, store_kind_from_env_value, system_user_from_env_value,
};
use ward_core::extract::{csv_filename, to_csv};
use ward_core::{
    open_store, AdmissionForm, CoreConfig, DetailsUpdate, NoteDraft, Patient, PatientFilter,
    PatientStatus, RecordId, Specialty, WardService,
};

#[derive(Parser)]
#[command(name = "ward")]
#[command(about = "Hospital ward management CLI")]
struct Cli {
    /// Patient data directory (overrides PATIENT_DATA_DIR)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List patients
    List {
        #[arg(long)]
        specialty: Option<Specialty>,
        /// Active or Discharged
        #[arg(long)]
        status: Option<PatientStatus>,
        #[arg(long)]
        mrn: Option<String>,
    },
    /// Admit a patient
    Admit {
        #[arg(long)]
        name: String,
        #[arg(long)]
        mrn: String,
        #[arg(long)]
        age: String,
        /// Male, Female or Other
        #[arg(long)]
        gender: String,
        #[arg(long)]
        diagnosis: String,
        #[arg(long)]
        specialty: String,
        #[arg(long)]
        doctor: Option<String>,
    },
    /// Edit a patient's diagnosis or assigned doctor
    Update {
        id: RecordId,
        #[arg(long)]
        diagnosis: Option<String>,
        /// Assigned doctor; an empty value clears it
        #[arg(long)]
        doctor: Option<String>,
    },
    /// Discharge an active patient
    Discharge {
        id: RecordId,
        /// Discharge notes
        notes: String,
    },
    /// Discharge the active patient holding an MRN, if any
    RequestDischarge { mrn: String },
    /// Add a medical note
    Note {
        id: RecordId,
        text: String,
        /// Note author
        #[arg(long)]
        user: Option<String>,
    },
    /// List a patient's notes
    Notes {
        id: RecordId,
        /// Only notes written on this day (YYYY-MM-DD)
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Print the daily specialty census
    Report,
    /// Write the notes of one day to patient_data_<date>.csv
    Extract {
        date: NaiveDate,
        /// Directory to write the CSV into
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },
}

fn print_patient(patient: &Patient) {
    println!(
        "ID: {}, MRN: {}, Name: {}, Specialty: {}, Status: {}, Admitted: {}, Days: {}",
        patient.id(),
        patient.mrn(),
        patient.name(),
        patient.specialty(),
        patient.status(),
        patient.admission_date().format("%Y-%m-%d %H:%M"),
        patient.days_admitted(Utc::now())
    );
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("ward_core=warn".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("Use 'ward --help' for commands");
        return Ok(());
    };

    let data_dir = cli.data_dir.unwrap_or_else(|| {
        patient_data_dir_from_env_value(std::env::var("PATIENT_DATA_DIR").ok())
    });
    let cfg = CoreConfig::new(
        data_dir,
        store_kind_from_env_value(std::env::var("WARD_STORE").ok())?,
        system_user_from_env_value(std::env::var("WARD_SYSTEM_USER").ok())?,
    )?;
    let ward = WardService::load(&cfg, open_store(&cfg)?).await?;

    match command {
        Commands::List {
            specialty,
            status,
            mrn,
        } => {
            let patients = ward
                .patients_matching(&PatientFilter {
                    specialty,
                    status,
                    mrn,
                })
                .await;
            if patients.is_empty() {
                println!("No patients found.");
            } else {
                patients.iter().for_each(print_patient);
            }
        }
        Commands::Admit {
            name,
            mrn,
            age,
            gender,
            diagnosis,
            specialty,
            doctor,
        } => {
            let form = AdmissionForm {
                name,
                mrn,
                age,
                gender,
                diagnosis,
                specialty,
                assigned_doctor: doctor,
            };
            match ward.admit(&form).await {
                Ok(patient) => println!("Admitted patient with ID: {}", patient.id()),
                Err(e) => eprintln!("Error admitting patient: {}", e),
            }
        }
        Commands::Update {
            id,
            diagnosis,
            doctor,
        } => {
            let details = DetailsUpdate {
                diagnosis,
                assigned_doctor: doctor,
            };
            match ward.update_details(id, &details).await {
                Ok(patient) => print_patient(&patient),
                Err(e) => eprintln!("Error updating patient: {}", e),
            }
        }
        Commands::Discharge { id, notes } => match ward.discharge(id, &notes).await {
            Ok(_) => println!("Discharged patient {}", id),
            Err(e) => eprintln!("Error discharging patient: {}", e),
        },
        Commands::RequestDischarge { mrn } => match ward.request_discharge(&mrn).await {
            Ok(Some(patient)) => println!("Discharged patient {}", patient.id()),
            Ok(None) => println!("No active patient with MRN {}", mrn.trim()),
            Err(e) => eprintln!("Error discharging patient: {}", e),
        },
        Commands::Note { id, text, user } => {
            let mut draft = NoteDraft::new(id, text);
            if let Some(user) = user {
                draft = draft.by(user);
            }
            match ward.add_note(draft).await {
                Ok(note) => println!("Added note {} for patient {}", note.id, id),
                Err(e) => eprintln!("Error adding note: {}", e),
            }
        }
        Commands::Notes { id, date } => {
            let notes = match date {
                Some(day) => ward.list_notes_by_date(id, day).await,
                None => ward.list_notes(id).await,
            };
            match notes {
                Ok(notes) if notes.is_empty() => println!("No notes found."),
                Ok(notes) => {
                    for note in notes {
                        println!(
                            "{} [{}] {}",
                            note.date.format("%Y-%m-%d %H:%M"),
                            note.user,
                            note.note
                        );
                    }
                }
                Err(e) => eprintln!("Error listing notes: {}", e),
            }
        }
        Commands::Report => {
            let report = ward.daily_report().await;
            println!("Daily report {}", report.date.format("%Y-%m-%d %H:%M"));
            for (specialty, census) in &report.specialties {
                println!(
                    "{}: {} active, {} discharged",
                    specialty,
                    census.active_patients.len(),
                    census.discharged_patients.len()
                );
            }
        }
        Commands::Extract { date, out_dir } => match ward.extract(date).await {
            Ok(rows) => {
                let path = out_dir.join(csv_filename(date));
                std::fs::write(&path, to_csv(&rows))?;
                println!("Wrote {} patients to {}", rows.len(), path.display());
            }
            Err(e) => eprintln!("Error extracting notes: {}", e),
        },
    }

    Ok(())
}
