//! The layer pipeline: load each cross-section in order, fan the
//! extraction work out to a bounded worker pool and merge the per-job
//! buffers into one global mesh.
//!
//! The main thread is the only owner of the global mesh. Workers build
//! private buffers and hand them back over a completion channel; the
//! channel receive is the ownership transfer, so nothing here needs a
//! lock. Triangles land in the mesh in completion order, which is fine
//! because an STL solid is an unordered bag of facets.

use std::{
    fs::File,
    io::{BufWriter, Write},
    path::PathBuf,
    sync::{mpsc, Arc},
};

use tracing::{debug, info};

use crate::{buffer::TriangleBuffer, extract, layer::Layer, stl, Error, Result};

/// Initial capacity of the global mesh, large enough that the first
/// reallocations happen well into the build.
const GLOBAL_CAPACITY: usize = 1 << 20;

/// Initial capacity of a per-job buffer.
const JOB_CAPACITY: usize = 10;

/// Upper bound on `--threads`.
pub const MAX_THREADS: usize = 200;

/// Everything one conversion run needs.
#[derive(Debug, Clone)]
pub struct Config {
    /// input path template containing one integer conversion
    pub input: String,

    /// output STL path
    pub output: PathBuf,

    /// index of the first layer
    pub first: u32,

    /// index of the last layer
    pub last: u32,

    /// worker thread count
    pub threads: usize,
}

impl Config {
    /// Check the command line contract. [`build_mesh`] itself is more
    /// permissive and also accepts a single layer stack.
    pub fn validate(&self) -> Result<()> {
        if self.input.is_empty() {
            return Err(Error::InvalidArgument("--input must be set".into()));
        }
        if self.output.as_os_str().is_empty() {
            return Err(Error::InvalidArgument("--output must be set".into()));
        }
        layer_path(&self.input, self.first)?;

        if self.last <= self.first {
            return Err(Error::InvalidArgument("--last must be > --first".into()));
        }
        if self.threads < 1 || self.threads > MAX_THREADS {
            return Err(Error::InvalidArgument(format!(
                "--threads must be between 1 and {MAX_THREADS}"
            )));
        }

        Ok(())
    }
}

/// Substitute the layer index into a printf style path template.
///
/// Exactly one `%d`, `%i` or `%u` conversion must be present, with an
/// optional padding width as in `%04d`. `%%` is a literal percent
/// sign.
pub fn layer_path(template: &str, z: u32) -> Result<String> {
    let bad = |msg: &str| Err(Error::InvalidArgument(format!("{msg} in input template {template:?}")));

    let mut out = String::with_capacity(template.len() + 8);
    let mut conversions = 0;
    let mut chars = template.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '%' {
            out.push(ch);
            continue;
        }
        if chars.peek() == Some(&'%') {
            chars.next();
            out.push('%');
            continue;
        }

        let zero_pad = chars.peek() == Some(&'0');
        if zero_pad {
            chars.next();
        }
        let mut width = 0;
        while let Some(digit) = chars.peek().and_then(|c| c.to_digit(10)) {
            width = width * 10 + digit as usize;
            chars.next();
        }

        match chars.next() {
            Some('d') | Some('i') | Some('u') => {
                conversions += 1;
                if zero_pad {
                    out.push_str(&format!("{z:0width$}"));
                } else {
                    out.push_str(&format!("{z:width$}"));
                }
            }
            _ => return bad("unsupported conversion"),
        }
    }

    if conversions != 1 {
        return bad("expected exactly one integer conversion");
    }

    Ok(out)
}

type JobResult = Result<TriangleBuffer>;

/// The worker pool plus the global mesh it feeds.
///
/// Submission applies backpressure: with every worker busy the main
/// thread blocks on the completion channel and merges finished buffers
/// until a slot frees up, so at most `threads` job buffers exist at any
/// time.
struct MeshBuilder {
    pool: rayon::ThreadPool,
    tx: mpsc::Sender<JobResult>,
    rx: mpsc::Receiver<JobResult>,
    mesh: TriangleBuffer,
    in_flight: usize,
}

impl MeshBuilder {
    fn new(threads: usize) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new().num_threads(threads).build()?;
        let (tx, rx) = mpsc::channel();

        Ok(MeshBuilder {
            pool,
            tx,
            rx,
            mesh: TriangleBuffer::with_capacity(GLOBAL_CAPACITY),
            in_flight: 0,
        })
    }

    fn submit<F>(&mut self, job: F) -> Result<()>
    where
        F: FnOnce(&mut TriangleBuffer) -> Result<()> + Send + 'static,
    {
        while self.in_flight >= self.pool.current_num_threads() {
            self.collect()?;
        }

        let tx = self.tx.clone();
        self.pool.spawn(move || {
            let mut buf = TriangleBuffer::with_capacity(JOB_CAPACITY);
            let res = job(&mut buf).map(|()| buf);
            // the receiver only disappears once the run has failed
            let _ = tx.send(res);
        });
        self.in_flight += 1;

        Ok(())
    }

    /// Wait for one job and merge its triangles into the mesh.
    fn collect(&mut self) -> Result<()> {
        let res = self.rx.recv().expect("worker pool disconnected");
        self.in_flight -= 1;
        self.mesh.concat(res?);
        Ok(())
    }

    fn finish(mut self) -> Result<TriangleBuffer> {
        while self.in_flight > 0 {
            self.collect()?;
        }
        Ok(self.mesh)
    }
}

/// Run the extraction over all layers and return the global mesh.
///
/// Per layer this schedules one job for all single-image facets and,
/// from the second layer on, one job for the facets on the separating
/// plane against the previous layer. The caps of the first and last
/// layer run synchronously on the main thread. Layers are shared with
/// the jobs through [`Arc`] handles and get dropped as soon as the
/// last job using them completes.
pub fn build_mesh(cfg: &Config) -> Result<TriangleBuffer> {
    let mut builder = MeshBuilder::new(cfg.threads)?;
    let mut prev: Option<Arc<Layer>> = None;

    for z in cfg.first..=cfg.last {
        let path = layer_path(&cfg.input, z)?;
        debug!(layer = z, path = %path, "loading layer");
        let layer = Arc::new(Layer::open(&path)?);

        if z == cfg.first {
            extract::add_bottom(&mut builder.mesh, &layer, z);
        }

        if let Some(below) = prev.take() {
            let above = Arc::clone(&layer);
            builder.submit(move |buf| extract::add_z(buf, &below, &above, z))?;
        }

        let img = Arc::clone(&layer);
        builder.submit(move |buf| {
            extract::add_front(buf, &img, z);
            extract::add_back(buf, &img, z);
            extract::add_left(buf, &img, z);
            extract::add_right(buf, &img, z);
            extract::add_x(buf, &img, z);
            extract::add_y(buf, &img, z);
            Ok(())
        })?;

        if z == cfg.last {
            extract::add_top(&mut builder.mesh, &layer, z);
        }

        prev = Some(layer);
    }

    builder.finish()
}

/// Convert a full image stack into an ASCII STL file.
pub fn run(cfg: &Config) -> Result<()> {
    // the output is opened before any layer is decoded so that an
    // unwritable path fails the run up front
    let file = File::create(&cfg.output).map_err(|source| Error::OutputOpen {
        path: cfg.output.display().to_string(),
        source,
    })?;

    let mesh = build_mesh(cfg)?;

    let name = cfg.output.display().to_string();
    let mut out = BufWriter::new(file);
    let count = stl::write_ascii(&mut out, &name, &mesh)?;
    out.flush()?;

    info!(facets = count, "mesh written");
    Ok(())
}
