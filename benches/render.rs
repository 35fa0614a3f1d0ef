use chrono::NaiveDate;
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use sdkport::config::{ConverterConfig, HeaderConfig};
use sdkport::descriptor::{ClassDescriptor, DescriptorKind};
use sdkport::generator::Renderer;
use sdkport::reflect::Reflector;
use std::fmt::Write;
use std::hint::black_box;

fn object_source(methods: usize) -> String {
    let mut source = String::from(
        "<?php\nnamespace FacebookAds\\Object;\n\nclass AdAccount extends AbstractCrudObject {\n\n  protected function getEndpoint() {\n    return 'adaccounts';\n  }\n",
    );
    for i in 0..methods {
        let _ = write!(
            source,
            "\n  /**\n   * Fetch edge number {i}.\n   */\n  public function getEdge{i}(array $fields = array(), array $params = array()) {{\n    return $this->getManyByConnection(Edge::className(), $fields, $params, 'edge{i}');\n  }}\n"
        );
    }
    source.push_str("}\n");
    source
}

fn fields_source(constants: usize) -> String {
    let mut source = String::from(
        "<?php\nnamespace FacebookAds\\Object\\Fields;\n\nclass AdAccountFields extends AbstractEnum {\n",
    );
    for i in 0..constants {
        let _ = writeln!(source, "  const FIELD_{i} = 'field_{i}';");
    }
    source.push_str("}\n");
    source
}

fn bench_reflect_and_render(c: &mut Criterion) {
    let config = ConverterConfig::default();
    let reflector = Reflector::new(config.source_namespaces.clone());
    let renderer = Renderer::new(
        config.object_base.clone(),
        config.enumeration_base.clone(),
        HeaderConfig::default(),
    );
    let generated_at = NaiveDate::from_ymd_opt(2024, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default();

    let mut group = c.benchmark_group("reflect_render");
    for size in [10usize, 100, 500] {
        let object = ClassDescriptor::new(
            DescriptorKind::Object,
            "AdAccount",
            "FacebookAds.Object",
            "\\FacebookAds\\Object\\AdAccount",
            "AdAccount.php",
        );
        let source = object_source(size);
        group.bench_with_input(BenchmarkId::new("object", size), &source, |b, source| {
            b.iter(|| {
                let facts = reflector
                    .reflect_source(black_box(&object), black_box(source))
                    .unwrap();
                let described = object.clone().with_facts(facts);
                black_box(renderer.render(&described, generated_at).unwrap())
            })
        });

        let fields = ClassDescriptor::new(
            DescriptorKind::FieldEnumeration,
            "AdAccountFields",
            "FacebookAds.Object.Fields",
            "\\FacebookAds\\Object\\Fields\\AdAccountFields",
            "AdAccountFields.php",
        );
        let source = fields_source(size);
        group.bench_with_input(BenchmarkId::new("fields", size), &source, |b, source| {
            b.iter(|| {
                let facts = reflector
                    .reflect_source(black_box(&fields), black_box(source))
                    .unwrap();
                let described = fields.clone().with_facts(facts);
                black_box(renderer.render(&described, generated_at).unwrap())
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_reflect_and_render);
criterion_main!(benches);
