use std::ffi::OsString;
use std::io::{self, Write};
use std::process::{Command, Stdio};

use indexmap::IndexMap;
use perf_core::errors::{ErrorInfo, SweepError};
use perf_results::{Metrics, RunRecord};
use perf_search::{Distribution, Objective};
use serde::Serialize;
use serde_json::Value;

use crate::driver::Measure;

fn measurement_error(code: &str, message: impl Into<String>, run_name: &str) -> SweepError {
    SweepError::Measurement(ErrorInfo::new(code, message).with_context("run", run_name))
}

#[derive(Serialize)]
struct MeasureRequest<'a> {
    run_name: &'a str,
    model_name: &'a str,
    parameters: &'a IndexMap<String, Value>,
    distributions: &'a IndexMap<String, Distribution>,
}

/// Measures objectives by running an external program once per objective.
///
/// The program receives a JSON request on stdin and must print a JSON object
/// of numeric metrics on stdout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandMeasurer {
    program: OsString,
    args: Vec<OsString>,
}

impl CommandMeasurer {
    /// Measurer running `program` with no arguments.
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Appends an argument.
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Appends several arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    fn request_bytes(run_name: &str, objective: &Objective) -> Result<Vec<u8>, SweepError> {
        let request = MeasureRequest {
            run_name,
            model_name: objective.model_name(),
            parameters: objective.values(),
            distributions: objective.distributions(),
        };
        serde_json::to_vec(&request).map_err(|err| {
            SweepError::Serde(
                ErrorInfo::new("measure-request", err.to_string()).with_context("run", run_name),
            )
        })
    }

    fn parse_metrics(run_name: &str, stdout: &[u8]) -> Result<Metrics, SweepError> {
        let value: Value = serde_json::from_slice(stdout)
            .map_err(|err| measurement_error("measure-output", err.to_string(), run_name))?;
        let Value::Object(map) = value else {
            return Err(measurement_error(
                "measure-output",
                "expected a JSON object of metrics",
                run_name,
            ));
        };
        let mut metrics = Metrics::new();
        for (name, raw) in map {
            match raw.as_f64() {
                Some(number) if number.is_finite() => {
                    metrics.insert(name, number);
                }
                _ => {
                    return Err(SweepError::Measurement(
                        ErrorInfo::new("measure-metric", "metric is not a finite number")
                            .with_context("run", run_name)
                            .with_context("metric", name)
                            .with_context("value", raw.to_string()),
                    ));
                }
            }
        }
        Ok(metrics)
    }
}

impl Measure for CommandMeasurer {
    fn measure(&mut self, run_name: &str, objective: &Objective) -> Result<RunRecord, SweepError> {
        let request = Self::request_bytes(run_name, objective)?;
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|err| {
                SweepError::Measurement(
                    ErrorInfo::new("measure-spawn", err.to_string())
                        .with_context("run", run_name)
                        .with_context("program", self.program.to_string_lossy()),
                )
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            match stdin.write_all(&request) {
                Ok(()) => {}
                Err(err) if err.kind() == io::ErrorKind::BrokenPipe => {}
                Err(err) => {
                    return Err(measurement_error("measure-stdin", err.to_string(), run_name));
                }
            }
        }

        let output = child
            .wait_with_output()
            .map_err(|err| measurement_error("measure-wait", err.to_string(), run_name))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SweepError::Measurement(
                ErrorInfo::new("measure-exit", format!("measurement program {}", output.status))
                    .with_context("run", run_name)
                    .with_context("stderr", stderr.trim()),
            ));
        }

        let metrics = Self::parse_metrics(run_name, &output.stdout)?;
        Ok(RunRecord::new(run_name, objective.clone(), metrics))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn metrics_must_be_finite_numbers() {
        let metrics =
            CommandMeasurer::parse_metrics("r", br#"{"throughput": 12.5, "latency": 3}"#).unwrap();
        assert_eq!(metrics["latency"], 3.0);

        let bad_outputs: [&[u8]; 3] = [br#"{"throughput": "fast"}"#, b"[1, 2]", b"not json"];
        for bad in bad_outputs {
            let err = CommandMeasurer::parse_metrics("r", bad).unwrap_err();
            assert!(matches!(err, SweepError::Measurement(_)));
        }
    }

    #[test]
    fn request_carries_parameters_and_distributions() {
        let objective = Objective::new("m", [("batch_size", json!(4))])
            .with_distribution("isl", Distribution::new(550.0, 50.0));
        let bytes = CommandMeasurer::request_bytes("m_run_0", &objective).unwrap();
        let value: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["run_name"], "m_run_0");
        assert_eq!(value["parameters"]["batch_size"], 4);
        assert_eq!(value["distributions"]["isl"]["mean"], 550.0);
    }

    #[cfg(unix)]
    #[test]
    fn runs_program_and_reads_metrics() {
        let mut measurer = CommandMeasurer::new("sh")
            .arg("-c")
            .arg(r#"cat > /dev/null; echo '{"throughput": 42.0}'"#);
        let objective = Objective::new("m", [("batch_size", json!(1))]);
        let record = measurer.measure("m_run_0", &objective).unwrap();
        assert_eq!(record.name(), "m_run_0");
        assert_eq!(record.metric("throughput"), Some(42.0));
        assert!(record.objective().same_point(&objective));
    }

    #[cfg(unix)]
    #[test]
    fn non_zero_exit_is_a_measurement_error() {
        let mut measurer = CommandMeasurer::new("sh").args(["-c", "echo boom >&2; exit 3"]);
        let objective = Objective::new("m", [("batch_size", json!(1))]);
        let err = measurer.measure("m_run_0", &objective).unwrap_err();
        assert_eq!(err.info().code, "measure-exit");
        assert_eq!(err.info().context["stderr"], "boom");
    }
}
