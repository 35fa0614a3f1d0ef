#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

pub mod fixtures {
    use sdkport::config::ConverterConfig;
    use sdkport::descriptor::KindMap;
    use std::fs;
    use std::path::{Path, PathBuf};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::{SystemTime, UNIX_EPOCH};

    static DIR_COUNTER: AtomicUsize = AtomicUsize::new(0);

    /// Creates an empty directory with a name unique to this process and call
    pub fn temp_dir(prefix: &str) -> PathBuf {
        let counter = DIR_COUNTER.fetch_add(1, Ordering::SeqCst);
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let dir = std::env::temp_dir().join(format!(
            "sdkport_{}_{}_{}_{}",
            prefix,
            std::process::id(),
            counter,
            nanos
        ));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    /// A miniature SDK source tree laid out like `src/FacebookAds/Object`
    pub struct SdkFixture {
        pub root: PathBuf,
    }

    impl SdkFixture {
        pub fn new(prefix: &str) -> Self {
            let fixture = SdkFixture {
                root: temp_dir(prefix),
            };
            for dir in [fixture.objects(), fixture.fields(), fixture.values()] {
                fs::create_dir_all(dir).unwrap();
            }
            fixture
        }

        pub fn sdk(&self) -> PathBuf {
            self.root.join("sdk")
        }

        pub fn out(&self) -> PathBuf {
            self.root.join("out")
        }

        pub fn objects(&self) -> PathBuf {
            self.sdk().join("FacebookAds/Object")
        }

        pub fn fields(&self) -> PathBuf {
            self.objects().join("Fields")
        }

        pub fn values(&self) -> PathBuf {
            self.objects().join("Values")
        }

        /// Converter configuration pointing at this tree, header untouched
        pub fn config(&self) -> ConverterConfig {
            ConverterConfig {
                sdk_root: self.sdk(),
                output_root: self.out(),
                ..ConverterConfig::default()
            }
        }

        /// Outputs relative to `out/`, one directory per kind
        pub fn output_dirs(&self) -> KindMap<PathBuf> {
            KindMap {
                object: self.out().join("Output"),
                fields: self.out().join("Output/Fields"),
                values: self.out().join("Output/Values"),
            }
        }

        pub fn write(&self, dir: &Path, file: &str, contents: &str) {
            fs::write(dir.join(file), contents).unwrap();
        }

        /// An object class with a literal endpoint and the given connection edges
        pub fn object(&self, name: &str, endpoint: &str, edges: &[(&str, &str)]) {
            let mut methods = String::new();
            for (method, edge) in edges {
                methods.push_str(&format!(
                    "\n  public function {method}(array $fields = array(), array $params = array()) {{\n    return $this->getManyByConnection(Thing::className(), $fields, $params, '{edge}');\n  }}\n"
                ));
            }
            self.write(
                &self.objects(),
                &format!("{name}.php"),
                &format!(
                    "<?php\nnamespace FacebookAds\\Object;\n\nclass {name} extends AbstractCrudObject {{\n\n  protected function getEndpoint() {{\n    return '{endpoint}';\n  }}\n{methods}}}\n"
                ),
            );
        }

        /// An enumeration class in the field or value root
        pub fn enumeration(&self, dir: &Path, namespace: &str, name: &str, constants: &[(&str, &str)]) {
            let body: String = constants
                .iter()
                .map(|(constant, value)| format!("  const {constant} = '{value}';\n"))
                .collect();
            self.write(
                dir,
                &format!("{name}.php"),
                &format!("<?php\nnamespace {namespace};\n\nclass {name} {{\n{body}}}\n"),
            );
        }

        pub fn field_enumeration(&self, name: &str, constants: &[(&str, &str)]) {
            self.enumeration(&self.fields(), "FacebookAds\\Object\\Fields", name, constants);
        }

        pub fn value_enumeration(&self, name: &str, constants: &[(&str, &str)]) {
            self.enumeration(&self.values(), "FacebookAds\\Object\\Values", name, constants);
        }
    }

    impl Drop for SdkFixture {
        fn drop(&mut self) {
            let _ = fs::remove_dir_all(&self.root);
        }
    }

    /// Every line of a generated file except the timestamp
    pub fn without_date(text: &str) -> Vec<&str> {
        text.lines()
            .filter(|line| !line.trim_start().starts_with("/// <date>"))
            .collect()
    }
}
