//! SDPA file format and the CSDP backend.

use super::problem::SdpProblem;
use super::{RawSolution, Solver, SolverSettings, SolverStatus};
use crate::error::{Error, Result};
use log::*;
use sprs::{CsMat, TriMat};
use std::fmt::Display;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::str::FromStr;
use std::sync::mpsc;
use std::thread;
use std::time::Instant;

// A line in a .sdpa format
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SdpaCoeff {
    pub mat: usize,
    pub block: usize,
    pub i: usize,
    pub j: usize,
    pub val: f64,
}

impl FromStr for SdpaCoeff {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut iter = s.split_whitespace();
        let mut next = || {
            iter.next()
                .ok_or_else(|| Error::Parse("Less than 5 elements".into()))
        };
        let result = SdpaCoeff {
            mat: next()?.parse()?,
            block: next()?.parse()?,
            i: next()?.parse()?,
            j: next()?.parse()?,
            val: next()?.parse()?,
        };
        if iter.next().is_some() {
            return Err(Error::Parse("More than 5 elements".into()));
        };
        Ok(result)
    }
}

impl Display for SdpaCoeff {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} {} {} {}",
            self.mat, self.block, self.i, self.j, self.val
        )
    }
}

// SDPA format for problems
// 1. dimension ( =b.len() )
// 2. n_blocks ( =block_sizes.len() )
// 3. block_sizes of length nblock
// 4. b of length dim
// 5+. list of coefficients, upper triangle only, 1-based
//     matrix 0 is C and matrix k is A_k
#[derive(Debug, Clone, PartialEq)]
pub struct SdpaProblem {
    block_sizes: Vec<usize>,
    b: Vec<f64>,
    coeffs: Vec<SdpaCoeff>,
}

fn push_upper(coeffs: &mut Vec<SdpaCoeff>, mat: usize, block: usize, m: &CsMat<f64>) {
    for (&val, (i, j)) in m.iter() {
        if i <= j && val != 0. {
            coeffs.push(SdpaCoeff {
                mat,
                block: block + 1,
                i: i + 1,
                j: j + 1,
                val,
            })
        }
    }
}

impl SdpaProblem {
    pub fn new(pb: &SdpProblem) -> Self {
        let mut coeffs = Vec::new();
        for (block, c) in pb.c.iter().enumerate() {
            push_upper(&mut coeffs, 0, block, c)
        }
        for (k, a_k) in pb.a.iter().enumerate() {
            for (block, m) in a_k.iter().enumerate() {
                push_upper(&mut coeffs, k + 1, block, m)
            }
        }
        Self {
            block_sizes: pb.block_sizes.clone(),
            b: pb.b.clone(),
            coeffs,
        }
    }
    /// The problem described by the file.
    pub fn to_problem(&self) -> Result<SdpProblem> {
        let nblocks = self.block_sizes.len();
        let mut tri: Vec<Vec<TriMat<f64>>> = (0..=self.b.len())
            .map(|_| {
                self.block_sizes
                    .iter()
                    .map(|&size| TriMat::new((size, size)))
                    .collect()
            })
            .collect();
        for coeff in &self.coeffs {
            if coeff.mat > self.b.len()
                || coeff.block == 0
                || coeff.block > nblocks
                || coeff.i == 0
                || coeff.j == 0
                || coeff.i.max(coeff.j) > self.block_sizes[coeff.block - 1]
            {
                return Err(Error::Parse(format!("Coefficient out of range: {}", coeff)));
            }
            let m = &mut tri[coeff.mat][coeff.block - 1];
            m.add_triplet(coeff.i - 1, coeff.j - 1, coeff.val);
            if coeff.i != coeff.j {
                m.add_triplet(coeff.j - 1, coeff.i - 1, coeff.val);
            }
        }
        let mut mats = tri
            .into_iter()
            .map(|blocks| blocks.iter().map(|m| m.to_csr()).collect::<Vec<CsMat<f64>>>());
        let c = mats.next().unwrap_or_default();
        Ok(SdpProblem {
            block_sizes: self.block_sizes.clone(),
            c,
            a: mats.collect(),
            b: self.b.clone(),
        })
    }
    pub fn write<P: AsRef<Path>>(&self, filename: P) -> Result<()> {
        let mut w = BufWriter::new(File::create(filename)?);
        writeln!(w, "{}", self.b.len())?;
        writeln!(w, "{}", self.block_sizes.len())?;
        for i in &self.block_sizes {
            write!(w, "{} ", i)?;
        }
        writeln!(w)?;
        for x in &self.b {
            write!(w, "{} ", x)?;
        }
        writeln!(w)?;
        for coeff in &self.coeffs {
            writeln!(w, "{}", coeff)?;
        }
        w.flush()?;
        Ok(())
    }
    pub fn load<P: AsRef<Path>>(filename: P) -> Result<Self> {
        let buf = BufReader::new(File::open(filename)?);
        let mut lines = Vec::new();
        for line in buf.lines() {
            let line = line?;
            let l = line.trim_start();
            if !l.starts_with('*') && !l.starts_with('"') && !l.is_empty() {
                lines.push(line)
            }
        }
        let mut lines = lines.into_iter();
        let mut next_line = || {
            lines
                .next()
                .ok_or_else(|| Error::Parse("Unexpected end of file".into()))
        };
        let dim: usize = first_word(&next_line()?)?.parse()?;
        let nblock: usize = first_word(&next_line()?)?.parse()?;
        // Block sizes may be separated by commas or braces
        let block_sizes = parse_numbers::<i64>(&next_line()?)?
            .into_iter()
            .map(|x| x.unsigned_abs() as usize)
            .collect::<Vec<_>>();
        if block_sizes.len() != nblock {
            return Err(Error::Parse(format!(
                "Expected {} block sizes, found {}",
                nblock,
                block_sizes.len()
            )));
        }
        let b = parse_numbers::<f64>(&next_line()?)?;
        if b.len() != dim {
            return Err(Error::Parse(format!(
                "Expected {} objective coefficients, found {}",
                dim,
                b.len()
            )));
        }
        let mut coeffs = Vec::new();
        for line in lines {
            coeffs.push(line.parse()?)
        }
        Ok(SdpaProblem {
            block_sizes,
            b,
            coeffs,
        })
    }
}

fn first_word(line: &str) -> Result<&str> {
    line.split_whitespace()
        .next()
        .ok_or_else(|| Error::Parse("Empty line".into()))
}

fn parse_numbers<T>(line: &str) -> Result<Vec<T>>
where
    T: FromStr,
    Error: From<T::Err>,
{
    line.split(|c: char| c.is_whitespace() || ",{}()".contains(c))
        .filter(|x| !x.is_empty())
        .map(|x| Ok(x.parse()?))
        .collect()
}

// SDPA format for certificates (as given by csdp)
// 1. vector y
// 2+. list of coefficients for Z and X
// matrix 1: Z, matrix 2: X
#[derive(Debug, Clone)]
pub struct SdpaCertificate {
    pub y: Vec<f64>,
    pub coeffs: Vec<SdpaCoeff>,
}

impl SdpaCertificate {
    pub fn load<P: AsRef<Path>>(filename: P) -> Result<Self> {
        let buf = BufReader::new(File::open(filename)?);
        let mut lines = Vec::new();
        for line in buf.lines() {
            let line = line?;
            if !line.trim_start().is_empty() {
                lines.push(line)
            }
        }
        let mut lines = lines.into_iter();
        let y = match lines.next() {
            Some(line) => parse_numbers(&line)?,
            None => return Err(Error::Parse("Empty certificate".into())),
        };
        let mut coeffs: Vec<SdpaCoeff> = Vec::new();
        for line in lines {
            coeffs.push(line.parse()?)
        }
        Ok(SdpaCertificate { y, coeffs })
    }
}

/// The CSDP solver, run as an external process.
///
/// The `csdp` executable must be in `PATH`.
#[derive(Debug, Clone)]
pub struct Csdp {
    settings: SolverSettings,
    /// Directory for the problem and certificate files.
    workdir: PathBuf,
}

impl Default for Csdp {
    fn default() -> Self {
        Self::new(SolverSettings::default())
    }
}

impl Csdp {
    pub fn new(settings: SolverSettings) -> Self {
        Self {
            settings,
            workdir: std::env::temp_dir(),
        }
    }
    pub fn with_workdir<P: Into<PathBuf>>(self, workdir: P) -> Self {
        Self {
            workdir: workdir.into(),
            ..self
        }
    }
    fn files(&self) -> (PathBuf, PathBuf) {
        let id = std::process::id();
        let tid = format!("{:?}", thread::current().id())
            .chars()
            .filter(char::is_ascii_digit)
            .collect::<String>();
        (
            self.workdir.join(format!("nc-graph-{}-{}.sdpa", id, tid)),
            self.workdir.join(format!("nc-graph-{}-{}.cert", id, tid)),
        )
    }
}

/// Status corresponding to an exit code of csdp.
pub fn csdp_status(code: i32) -> SolverStatus {
    match code {
        0 => SolverStatus::Optimal,
        // Infeasibility of the primal of csdp means that our problem is unbounded
        1 => SolverStatus::Unbounded,
        2 => SolverStatus::Infeasible,
        3 => SolverStatus::Inaccurate,
        4 => SolverStatus::MaxIterations,
        _ => SolverStatus::NumericalFailure,
    }
}

impl Solver for Csdp {
    fn solve(&self, pb: &SdpProblem) -> Result<RawSolution> {
        let (problem_file, certificate_file) = self.files();
        let result = self.run(pb, &problem_file, &certificate_file);
        remove_files(&[problem_file.as_path(), certificate_file.as_path()]);
        result
    }
}

// Missing files are fine: csdp may have failed before writing its certificate
fn remove_files(files: &[&Path]) {
    for file in files {
        if let Err(e) = std::fs::remove_file(file) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("Cannot remove {}: {}", file.display(), e);
            }
        }
    }
}

impl Csdp {
    fn run(
        &self,
        pb: &SdpProblem,
        problem_file: &Path,
        certificate_file: &Path,
    ) -> Result<RawSolution> {
        SdpaProblem::new(pb).write(problem_file)?;
        let _ = std::fs::remove_file(certificate_file);
        let mut command = Command::new("csdp");
        command.arg(&problem_file).arg(&certificate_file);
        info!("Calling CSDP");
        debug!("command: {:?}", command);
        let mut child = command.stdout(Stdio::piped()).spawn()?;
        let output = child
            .stdout
            .take()
            .ok_or_else(|| Error::Parse("No output from csdp".into()))?;
        // Read on another thread so that the timeout can interrupt the wait
        let (sender, receiver) = mpsc::channel();
        let _reader = thread::spawn(move || {
            for line in BufReader::new(output).lines() {
                match line {
                    Ok(line) => {
                        if sender.send(line).is_err() {
                            break;
                        }
                    }
                    Err(_) => break,
                }
            }
        });
        let time_start = Instant::now();
        let mut stream = false;
        let mut iterations = 0;
        let mut primal_objective = f64::NAN;
        let mut dual_objective = f64::NAN;
        loop {
            let line = match self.settings.timeout {
                Some(timeout) => {
                    let remaining = timeout.saturating_sub(time_start.elapsed());
                    match receiver.recv_timeout(remaining) {
                        Ok(line) => Some(line),
                        Err(mpsc::RecvTimeoutError::Timeout) => {
                            warn!("csdp timed out after {:.2?}, killing it", timeout);
                            child.kill()?;
                            let _ = child.wait()?;
                            return Ok(RawSolution {
                                status: SolverStatus::TimedOut,
                                primal_objective,
                                dual_objective,
                                y: Vec::new(),
                                iterations,
                            });
                        }
                        Err(mpsc::RecvTimeoutError::Disconnected) => None,
                    }
                }
                None => receiver.recv().ok(),
            };
            let Some(line) = line else { break };
            if line.starts_with("Iter") {
                iterations += 1;
                if !stream && time_start.elapsed() > self.settings.stream_after {
                    stream = true;
                    info!(
                        "csdp is taking more than {}s, start streaming output",
                        self.settings.stream_after.as_secs_f32()
                    )
                }
                if stream {
                    info!("{}", line)
                } else {
                    debug!("{}", line)
                }
            } else if let Some(v) = line.strip_prefix("Primal objective value:") {
                primal_objective = v.trim().parse()?
            } else if let Some(v) = line.strip_prefix("Dual objective value:") {
                dual_objective = v.trim().parse()?
            } else if !line.trim().is_empty() {
                debug!("{}", line)
            }
        }
        let code = child
            .wait()?
            .code()
            .ok_or_else(|| Error::Parse("csdp was killed by a signal".into()))?;
        let status = csdp_status(code);
        info!("csdp returned with code {} ({:?})", code, status);
        let y = if status.is_usable() {
            SdpaCertificate::load(certificate_file)?.y
        } else {
            Vec::new()
        };
        Ok(RawSolution {
            status,
            primal_objective,
            dual_objective,
            y,
            iterations,
        })
    }
}
