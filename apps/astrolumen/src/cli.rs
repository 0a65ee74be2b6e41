use astrolumen::{
    ChartRequest, Language, LunationPhase, LunationRequest, OrbConfig, ProgressionRequest,
    SolarReturnRequest, ZodiacKind,
};
use chrono::{NaiveDate, NaiveTime};
use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about)]
pub(crate) struct Args {
    /// Settings file (default: configs/astrolumen.toml when present).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Use the built-in mean-motion ephemeris regardless of settings.
    #[arg(long, global = true, default_value_t = false)]
    pub mock: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Command {
    /// Natal chart for a birth moment and place.
    Natal(ChartArgs),
    /// Solar return chart for a given year.
    SolarReturn {
        #[command(flatten)]
        chart: ChartArgs,
        #[arg(long)]
        year: i32,
    },
    /// Secondary progression to a target date.
    Progression {
        #[command(flatten)]
        chart: ChartArgs,
        #[arg(long)]
        target_date: NaiveDate,
    },
    /// Next new or full moon after a reference date.
    Lunation {
        #[arg(long)]
        date: NaiveDate,
        #[arg(long, value_enum, default_value_t = PhaseArg::New)]
        phase: PhaseArg,
        #[arg(long, value_enum, default_value_t = ZodiacArg::Tropical)]
        zodiac: ZodiacArg,
        #[arg(long)]
        sidereal_mode: Option<String>,
    },
}

#[derive(ClapArgs, Debug, Clone)]
pub(crate) struct ChartArgs {
    /// Birth date, YYYY-MM-DD.
    #[arg(long)]
    pub date: NaiveDate,

    /// Local birth time, HH:MM or HH:MM:SS.
    #[arg(long, value_parser = parse_time)]
    pub time: NaiveTime,

    /// Place name or "lat, lon".
    #[arg(long)]
    pub place: String,

    #[arg(long)]
    pub name: Option<String>,

    #[arg(long, value_enum, default_value_t = LanguageArg::PtBr)]
    pub language: LanguageArg,

    /// Single-letter house system code.
    #[arg(long, default_value = "P")]
    pub house_system: String,

    #[arg(long, value_enum, default_value_t = ZodiacArg::Tropical)]
    pub zodiac: ZodiacArg,

    #[arg(long)]
    pub sidereal_mode: Option<String>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub(crate) enum LanguageArg {
    #[value(name = "pt-BR")]
    PtBr,
    En,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub(crate) enum ZodiacArg {
    Tropical,
    Sidereal,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub(crate) enum PhaseArg {
    New,
    Full,
}

impl From<LanguageArg> for Language {
    fn from(arg: LanguageArg) -> Self {
        match arg {
            LanguageArg::PtBr => Language::PtBr,
            LanguageArg::En => Language::En,
        }
    }
}

impl From<ZodiacArg> for ZodiacKind {
    fn from(arg: ZodiacArg) -> Self {
        match arg {
            ZodiacArg::Tropical => ZodiacKind::Tropical,
            ZodiacArg::Sidereal => ZodiacKind::Sidereal,
        }
    }
}

impl From<PhaseArg> for LunationPhase {
    fn from(arg: PhaseArg) -> Self {
        match arg {
            PhaseArg::New => LunationPhase::New,
            PhaseArg::Full => LunationPhase::Full,
        }
    }
}

fn parse_time(value: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(value, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M"))
        .map_err(|e| format!("invalid time {value:?}: {e}"))
}

impl ChartArgs {
    /// Orbs come from settings; the command line does not override them.
    pub fn into_request(self, orbs: &OrbConfig) -> ChartRequest {
        let mut request = ChartRequest::new(self.date, self.time, self.place);
        request.subject_name = self.name;
        request.language = self.language.into();
        request.house_system = self.house_system;
        request.zodiac = self.zodiac.into();
        request.sidereal_mode = self.sidereal_mode;
        request.orbs = orbs.clone();
        request
    }
}

pub(crate) fn solar_return_request(chart: ChartArgs, year: i32, orbs: &OrbConfig) -> SolarReturnRequest {
    SolarReturnRequest {
        chart: chart.into_request(orbs),
        year,
    }
}

pub(crate) fn progression_request(
    chart: ChartArgs,
    target_date: NaiveDate,
    orbs: &OrbConfig,
) -> ProgressionRequest {
    ProgressionRequest {
        chart: chart.into_request(orbs),
        target_date,
    }
}

pub(crate) fn lunation_request(
    date: NaiveDate,
    phase: PhaseArg,
    zodiac: ZodiacArg,
    sidereal_mode: Option<String>,
) -> LunationRequest {
    let mut request = LunationRequest::new(date, phase.into());
    request.zodiac = zodiac.into();
    request.sidereal_mode = sidereal_mode;
    request
}
