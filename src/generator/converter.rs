use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use chrono::{Local, NaiveDateTime};
use tracing::{debug, info, warn};

use super::report::{FileOutcome, FileStatus, RunReport};
use super::templates::Renderer;
use super::writer::OutputWriter;
use crate::config::ConverterConfig;
use crate::descriptor::{ClassDescriptor, DescriptorKind, KindMap};
use crate::error::ConvertError;
use crate::reflect::Reflector;
use crate::scanner::{scan_root, ScanTarget};

/// Descriptors discovered across all three input roots
#[derive(Debug, Default)]
pub struct Discovery {
    /// Descriptors in discovery order (object root, then fields, then values)
    pub descriptors: Vec<ClassDescriptor>,
    /// Files skipped because their name is not a usable class name
    pub skipped: usize,
}

/// Result of reflecting one descriptor without rendering it
#[derive(Debug)]
pub struct Inspection {
    /// The descriptor, with facts attached when reflection succeeded
    pub descriptor: ClassDescriptor,
    /// Why reflection failed
    pub error: Option<ConvertError>,
}

/// Runs the scan → reflect → render → write pipeline over a whole SDK tree
#[derive(Debug)]
pub struct Converter {
    config: ConverterConfig,
    reflector: Reflector,
    renderer: Renderer,
    writer: OutputWriter,
    dry_run: bool,
}

impl Converter {
    /// Create a converter from a configuration
    pub fn new(config: ConverterConfig) -> Self {
        let reflector = Reflector::new(config.source_namespaces.clone())
            .with_object_root(config.input_dir(DescriptorKind::Object));
        let renderer = Renderer::new(
            config.object_base.clone(),
            config.enumeration_base.clone(),
            config.header.clone(),
        );
        let writer = OutputWriter::new(
            KindMap::from_fn(|kind| config.output_dir(kind)),
            config.extension.clone(),
        );
        Converter {
            config,
            reflector,
            renderer,
            writer,
            dry_run: false,
        }
    }

    /// Render without writing anything
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// The configuration this converter was built from
    pub fn config(&self) -> &ConverterConfig {
        &self.config
    }

    /// Scan the three input roots
    ///
    /// All roots are scanned before anything else happens, so a missing root
    /// aborts the run before a single file is written.
    ///
    /// # Errors
    ///
    /// Returns [`ConvertError::DirectoryNotFound`] for the first missing root.
    pub fn discover(&self) -> Result<Discovery, ConvertError> {
        let mut discovery = Discovery::default();
        for kind in DescriptorKind::ALL {
            let root = self.config.input_dir(kind);
            let target = ScanTarget {
                kind,
                root: &root,
                namespace: self.config.namespaces.get(kind),
                source_namespace: self.config.source_namespaces.get(kind),
            };
            let result = scan_root(target, &self.config.denylist)?;
            debug!(
                kind = %kind,
                root = %root.display(),
                found = result.descriptors.len(),
                skipped = result.skipped.len(),
                "Scanned input root"
            );
            discovery.skipped += result.skipped.len();
            discovery.descriptors.extend(result.descriptors);
        }
        Ok(discovery)
    }

    /// Convert every discovered class, stamping headers with the current local time
    ///
    /// # Errors
    ///
    /// Only a missing input root is returned as an error; per-file failures are
    /// recorded in the report.
    pub fn run(&self) -> Result<RunReport, ConvertError> {
        self.run_at(Local::now().naive_local())
    }

    /// Convert every discovered class with `generated_at` as the header timestamp
    ///
    /// # Errors
    ///
    /// See [`Converter::run`].
    pub fn run_at(&self, generated_at: NaiveDateTime) -> Result<RunReport, ConvertError> {
        let started = Instant::now();
        info!(
            started_at = %generated_at.format("%Y-%m-%d %H:%M:%S"),
            jobs = self.config.jobs,
            dry_run = self.dry_run,
            "Starting converter"
        );

        let discovery = self.discover()?;
        let discovered = discovery.descriptors.len();
        let outcomes = self.process_all(discovery.descriptors, generated_at);

        let report = RunReport {
            discovered,
            skipped: discovery.skipped,
            outcomes,
            started_at: generated_at,
            elapsed: started.elapsed(),
        };
        info!(
            discovered = report.discovered,
            succeeded = report.succeeded(),
            failed = report.failed(),
            elapsed_ms = report.elapsed.as_millis() as u64,
            "Converter finished"
        );
        Ok(report)
    }

    /// Discover and reflect every class without rendering or writing
    ///
    /// # Errors
    ///
    /// Returns [`ConvertError::DirectoryNotFound`] for a missing root; reflection
    /// failures are reported per descriptor.
    pub fn inspect(&self) -> Result<Vec<Inspection>, ConvertError> {
        let discovery = self.discover()?;
        Ok(discovery
            .descriptors
            .into_iter()
            .map(|descriptor| match self.reflector.reflect(&descriptor) {
                Ok(facts) => Inspection {
                    descriptor: descriptor.with_facts(facts),
                    error: None,
                },
                Err(err) => Inspection {
                    descriptor,
                    error: Some(err),
                },
            })
            .collect())
    }

    fn process_all(
        &self,
        descriptors: Vec<ClassDescriptor>,
        generated_at: NaiveDateTime,
    ) -> Vec<FileOutcome> {
        let jobs = self.config.jobs.clamp(1, descriptors.len().max(1));
        if jobs == 1 {
            return descriptors
                .iter()
                .enumerate()
                .map(|(index, d)| self.process(index, d, generated_at))
                .collect();
        }

        let cursor = AtomicUsize::new(0);
        let mut outcomes: Vec<FileOutcome> = thread::scope(|scope| {
            let mut workers = Vec::with_capacity(jobs);
            for _ in 0..jobs {
                workers.push(scope.spawn(|| {
                    let mut local = Vec::new();
                    loop {
                        let index = cursor.fetch_add(1, Ordering::Relaxed);
                        let Some(descriptor) = descriptors.get(index) else {
                            break;
                        };
                        local.push(self.process(index, descriptor, generated_at));
                    }
                    local
                }));
            }
            workers
                .into_iter()
                .flat_map(|worker| {
                    worker
                        .join()
                        .unwrap_or_else(|panic| std::panic::resume_unwind(panic))
                })
                .collect()
        });
        outcomes.sort_by_key(|o| o.index);
        outcomes
    }

    fn process(
        &self,
        index: usize,
        descriptor: &ClassDescriptor,
        generated_at: NaiveDateTime,
    ) -> FileOutcome {
        let started = Instant::now();
        let mut render_duration = None;
        let status = match self.convert(descriptor, generated_at, &mut render_duration) {
            Ok(status) => status,
            Err(err) => {
                warn!(
                    file = %descriptor.source_file.display(),
                    kind = %descriptor.kind,
                    error_kind = err.kind_name(),
                    error = %err,
                    "Failed to convert class"
                );
                FileStatus::Failed(err)
            }
        };
        let duration = started.elapsed();
        debug!(
            class = %descriptor.short_name,
            kind = %descriptor.kind,
            namespace = %descriptor.namespace,
            duration_us = duration.as_micros() as u64,
            render_us = render_duration.map(|d| d.as_micros() as u64),
            "Processed class"
        );
        FileOutcome {
            index,
            kind: descriptor.kind,
            short_name: descriptor.short_name.clone(),
            source_file: descriptor.source_file.clone(),
            duration,
            render_duration,
            status,
        }
    }

    fn convert(
        &self,
        descriptor: &ClassDescriptor,
        generated_at: NaiveDateTime,
        render_duration: &mut Option<Duration>,
    ) -> Result<FileStatus, ConvertError> {
        let facts = self.reflector.reflect(descriptor)?;
        let descriptor = descriptor.clone().with_facts(facts);
        let render_started = Instant::now();
        let text = self.renderer.render(&descriptor, generated_at)?;
        *render_duration = Some(render_started.elapsed());

        if self.dry_run {
            let path = self.writer.output_path(descriptor.kind, &descriptor.short_name);
            return Ok(FileStatus::Planned(path));
        }
        let path = self
            .writer
            .write(descriptor.kind, &descriptor.short_name, &text)?;
        info!(path = %path.display(), "File saved");
        Ok(FileStatus::Written(path))
    }
}
