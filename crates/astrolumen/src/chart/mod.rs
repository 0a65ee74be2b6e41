pub mod assembler;
pub mod request;
pub mod snapshot;
pub mod summary;
pub mod techniques;

pub use assembler::{ChartAssembler, ChartFrame, ResolvedPlace};
pub use request::{ChartRequest, LunationPhase, LunationRequest, ProgressionRequest, SolarReturnRequest};
pub use snapshot::{AnglePoint, ChartMetadata, ChartPoints, ChartSnapshot, HouseCusp, PlanetPosition};
pub use summary::build_summary;
pub use techniques::{
    anniversary, progression_offset, LunationEvent, ProgressedChart, SolarReturnChart,
    TROPICAL_YEAR_DAYS,
};
