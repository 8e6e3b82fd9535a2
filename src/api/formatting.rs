//! Instruction output formatting
//!
//! Instructions are emitted as JSON lines by default. A human-readable text
//! layout and CSV rows are available for console use and offline analysis.

use crate::core::{Coordinate, Fix};
use crate::navigation::{Instruction, NavigationMode};
use std::fmt::Write;

/// Output layout for emitted instructions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Json,
    Text,
    Csv,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "text" => Ok(Self::Text),
            "csv" => Ok(Self::Csv),
            other => Err(format!("unknown output format '{}'", other)),
        }
    }
}

/// Formats instructions in one of the supported layouts
#[derive(Debug, Clone, Default)]
pub struct InstructionFormatter {
    format: OutputFormat,
    text: TextFormatter,
    json: JsonFormatter,
}

impl InstructionFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            ..Default::default()
        }
    }

    pub fn format_kind(&self) -> OutputFormat {
        self.format
    }

    /// Line written before the first instruction, if the layout has one
    pub fn header(&self) -> Option<String> {
        match self.format {
            OutputFormat::Csv => Some(CsvFormatter::header().to_string()),
            OutputFormat::Json | OutputFormat::Text => None,
        }
    }

    pub fn format(&self, instruction: &Instruction) -> Result<String, serde_json::Error> {
        match self.format {
            OutputFormat::Json => self.json.format_json(instruction),
            OutputFormat::Text => Ok(self.text.format_text(instruction)),
            OutputFormat::Csv => Ok(CsvFormatter::format_csv(instruction)),
        }
    }
}

/// Bracketed fix summary shown while probing the link
pub fn format_fix(fix: Option<&Fix>) -> String {
    match fix {
        Some(fix) => fix.to_string(),
        None => "[no fix]".to_string(),
    }
}

/// Human-readable text formatter
#[derive(Debug, Clone, Default)]
pub struct TextFormatter {
    /// Single line per instruction
    pub compact: bool,
}

impl TextFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn compact() -> Self {
        Self { compact: true }
    }

    pub fn format_text(&self, instruction: &Instruction) -> String {
        let position = instruction
            .position()
            .map_or_else(|| "unknown".to_string(), |p| p.to_string());

        if self.compact {
            let mut line = format!(
                "#{} {} -> #{} {} | {:.1}° {:.1} m",
                instruction.sequence,
                position,
                instruction.destination_index,
                instruction.destination,
                instruction.bearing_deg,
                instruction.distance_m
            );
            if let Some(xtd) = instruction.cross_track_m {
                let _ = write!(line, " | xtd {:+.1} m", xtd);
            }
            return line;
        }

        let mut output = String::new();
        let mode = match instruction.mode {
            NavigationMode::Live => "live",
            NavigationMode::Simulated => "simulated",
        };
        let _ = writeln!(output, "Instruction #{} ({})", instruction.sequence, mode);
        if let Some(live) = &instruction.live_position {
            let _ = writeln!(output, "  Live position:      {}", live);
        }
        if let Some(simulated) = &instruction.simulated_position {
            let _ = writeln!(output, "  Simulated position: {}", simulated);
        }
        let _ = writeln!(
            output,
            "  Destination:        {} (waypoint {})",
            instruction.destination, instruction.destination_index
        );
        let _ = writeln!(output, "  Bearing:            {:.2}°", instruction.bearing_deg);
        let _ = writeln!(output, "  Distance:           {:.1} m", instruction.distance_m);
        if let Some(xtd) = instruction.cross_track_m {
            let _ = writeln!(output, "  Cross-track:        {:+.1} m", xtd);
        }
        if let Some(velocity) = instruction.velocity_mps {
            let _ = writeln!(output, "  Velocity:           {:.2} m/s", velocity);
        }
        let _ = writeln!(
            output,
            "  Time:               {}.{:03} (+{:.3} s)",
            instruction.time.epoch_secs, instruction.time.subsec_millis, instruction.time.elapsed_secs
        );
        output
    }
}

/// JSON formatter for structured output
#[derive(Debug, Clone, Default)]
pub struct JsonFormatter {
    pub pretty: bool,
}

impl JsonFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pretty() -> Self {
        Self { pretty: true }
    }

    pub fn format_json(&self, instruction: &Instruction) -> Result<String, serde_json::Error> {
        if self.pretty {
            serde_json::to_string_pretty(instruction)
        } else {
            serde_json::to_string(instruction)
        }
    }
}

/// CSV formatter for data logging
pub struct CsvFormatter;

impl CsvFormatter {
    pub fn header() -> &'static str {
        "sequence,mode,epoch_secs,subsec_millis,elapsed_secs,latitude,longitude,\
         destination_index,destination_latitude,destination_longitude,bearing_deg,\
         distance_m,cross_track_m,velocity_mps"
    }

    pub fn format_csv(instruction: &Instruction) -> String {
        let position = instruction.position();
        let optional = |value: Option<f64>, precision: usize| {
            value.map_or_else(String::new, |v| format!("{:.*}", precision, v))
        };
        let mode = match instruction.mode {
            NavigationMode::Live => "live",
            NavigationMode::Simulated => "simulated",
        };

        format!(
            "{},{},{},{},{:.3},{},{},{},{:.6},{:.6},{:.2},{:.1},{},{}",
            instruction.sequence,
            mode,
            instruction.time.epoch_secs,
            instruction.time.subsec_millis,
            instruction.time.elapsed_secs,
            optional(position.map(|p: Coordinate| p.latitude), 6),
            optional(position.map(|p: Coordinate| p.longitude), 6),
            instruction.destination_index,
            instruction.destination.latitude,
            instruction.destination.longitude,
            instruction.bearing_deg,
            instruction.distance_m,
            optional(instruction.cross_track_m, 1),
            optional(instruction.velocity_mps, 2),
        )
    }
}
