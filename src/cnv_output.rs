use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufWriter, Write};

use camino::Utf8Path;
use itertools::Itertools;
use log::info;
use unwrap::unwrap;

use crate::call_cnvs::{CnvCallResult, CnvRange};
use crate::cohort::Cohort;
use crate::filenames::{CNV_FILENAME, SEG_FILENAME_SUFFIX};
use crate::gene_annotation::{GeneAnnotationCache, GeneLookup};

/// Optional gene annotation settings for the CNV table
pub struct GeneAnnotation<'a> {
    pub lookup: &'a dyn GeneLookup,

    /// Genes within this distance of a region are included in its annotation
    pub flank: i64,
}

/// Write one CNV table line for `range`
fn write_cnv_record<W: Write>(
    f: &mut W,
    cohort: &Cohort,
    call_result: &CnvCallResult,
    range: &CnvRange,
    gene_cache: Option<&mut GeneAnnotationCache>,
) {
    let sample_count = cohort.samples.len();
    let cells = &call_result.cells[range.start..=range.end];
    let regions = cells
        .iter()
        .map(|x| &cohort.regions[x.region_index])
        .collect::<Vec<_>>();
    let first_region = regions[0];
    let last_region = regions[regions.len() - 1];
    let chrom_label = cohort.chrom_list.label(first_region.chrom_index);

    let copies = cells.iter().map(|x| x.copies).join(",");
    let z_scores = cells.iter().map(|x| format!("{:.2}", x.z)).join(",");
    let cnv_af = cells
        .iter()
        .map(|x| {
            let region_event_count = call_result.event_counts.region[x.region_index];
            format!("{:.3}", region_event_count as f64 / sample_count as f64)
        })
        .join(",");
    let region_strs = regions
        .iter()
        .map(|x| x.to_region_str(&cohort.chrom_list))
        .collect::<Vec<_>>();

    write!(
        f,
        "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
        chrom_label,
        first_region.start,
        last_region.end,
        cohort.samples[range.sample_index].name,
        last_region.end - first_region.start + 1,
        cells.len(),
        copies,
        z_scores,
        cnv_af,
        region_strs.join(","),
    )
    .unwrap();

    if let Some(gene_cache) = gene_cache {
        let mut genes = BTreeSet::new();
        for (region, region_str) in regions.iter().zip(region_strs.iter()) {
            genes.extend(
                gene_cache
                    .get_genes(region_str, chrom_label, region.start, region.end)
                    .iter()
                    .cloned(),
            );
        }
        write!(f, "\t{}", genes.iter().join(",")).unwrap();
    }
    writeln!(f).unwrap();
}

/// Write the CNV table for all final CNV ranges
///
/// A gene column is added when `gene_annotation` is provided.
///
pub fn write_cnv_table<W: Write>(
    f: &mut W,
    cohort: &Cohort,
    call_result: &CnvCallResult,
    gene_annotation: Option<&GeneAnnotation>,
) {
    let mut gene_cache = gene_annotation.map(|x| GeneAnnotationCache::new(x.lookup, x.flank));

    write!(
        f,
        "#chr\tstart\tend\tsample\tsize\tregion_count\tregion_copy_numbers\tregion_zscores\tregion_cnv_af\tregion_coordinates"
    )
    .unwrap();
    if gene_cache.is_some() {
        write!(f, "\tgenes").unwrap();
    }
    writeln!(f).unwrap();

    for range in call_result.ranges.iter() {
        write_cnv_record(f, cohort, call_result, range, gene_cache.as_mut());
    }
}

pub fn write_cnv_file(
    output_dir: &Utf8Path,
    cohort: &Cohort,
    call_result: &CnvCallResult,
    gene_annotation: Option<&GeneAnnotation>,
) {
    let filename = output_dir.join(CNV_FILENAME);

    info!("Writing CNV calls to file: '{filename}'");

    let f = unwrap!(
        File::create(&filename),
        "Unable to create CNV output file: '{filename}'"
    );
    let mut f = BufWriter::new(f);
    write_cnv_table(&mut f, cohort, call_result, gene_annotation);
}

/// Write an IGV SEG heatmap track of z-scores for one QC-passing sample
///
/// All QC-failing regions are appended after the sample's result cells.
///
pub fn write_seg_track<W: Write>(
    f: &mut W,
    cohort: &Cohort,
    call_result: &CnvCallResult,
    sample_index: usize,
) {
    let sample = &cohort.samples[sample_index];
    writeln!(f, "#type=GENE_EXPRESSION").unwrap();
    writeln!(
        f,
        "#track graphtype=heatmap name=\"{} CN z-score\" midRange=-2.5:2.5 color=0,0,255 altColor=255,0,0 viewLimits=-5:5 maxHeightPixels=80:80:80",
        sample.name
    )
    .unwrap();
    writeln!(f, "ID\tchr\tstart\tend\tlog2-ratio\tcopy-number\tz-score").unwrap();

    for cell in call_result
        .cells
        .iter()
        .filter(|x| x.sample_index == sample_index)
    {
        let region = &cohort.regions[cell.region_index];
        writeln!(
            f,
            "\t{}\t{}\t{}\t{:.2}\t{}\t{:.2}",
            cohort.chrom_list.label(region.chrom_index),
            region.start,
            region.end,
            (cell.norm_depth / cell.reference).log2(),
            cell.copies,
            cell.z
        )
        .unwrap();
    }

    for region in cohort.removed_regions.iter() {
        writeln!(
            f,
            "\t{}\t{}\t{}\tQC failed\tQC failed\t0.0",
            cohort.chrom_list.label(region.chrom_index),
            region.start,
            region.end
        )
        .unwrap();
    }
}

pub fn write_seg_file(
    output_dir: &Utf8Path,
    cohort: &Cohort,
    call_result: &CnvCallResult,
    sample_index: usize,
) {
    let sample = &cohort.samples[sample_index];
    let filename = output_dir.join(sample.name.clone() + SEG_FILENAME_SUFFIX);

    info!(
        "Writing SEG track for sample '{}' to file: '{filename}'",
        sample.name
    );

    let f = unwrap!(
        File::create(&filename),
        "Unable to create SEG track file: '{filename}'"
    );
    let mut f = BufWriter::new(f);
    write_seg_track(&mut f, cohort, call_result, sample_index);
}


#[cfg(test)]
mod tests {
    use super::test_utils::get_called_test_cohort;
    use super::*;

    struct TestLookup;

    impl GeneLookup for TestLookup {
        fn genes_overlapping(
            &self,
            chrom: &str,
            start: i64,
            _end: i64,
            _flank: i64,
        ) -> Vec<String> {
            if chrom == "chr1" && start < 2000 {
                vec!["GENE_B".to_string(), "GENE_A".to_string()]
            } else {
                vec!["GENE_C".to_string()]
            }
        }
    }

    #[test]
    fn test_write_cnv_table() {
        let (cohort, call_result) = get_called_test_cohort();
        let mut output = Vec::new();
        write_cnv_table(&mut output, &cohort, &call_result, None);
        let output = String::from_utf8(output).unwrap();
        let lines = output.lines().collect::<Vec<_>>();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].ends_with("region_coordinates"));
        assert_eq!(
            lines[1],
            "chr1\t0\t2100\ts0\t2101\t3\t3,3,3\t5.20,4.80,3.00\t0.333,0.333,0.333\tchr1:0-100,chr1:1000-1100,chr1:2000-2100"
        );
        assert_eq!(
            lines[2],
            "chr2\t4000\t5100\ts1\t1101\t2\t1,1\t-5.00,-5.50\t0.333,0.333\tchr2:4000-4100,chr2:5000-5100"
        );
    }

    #[test]
    fn test_write_cnv_table_genes() {
        let (cohort, call_result) = get_called_test_cohort();
        let gene_annotation = GeneAnnotation {
            lookup: &TestLookup,
            flank: 20,
        };
        let mut output = Vec::new();
        write_cnv_table(&mut output, &cohort, &call_result, Some(&gene_annotation));
        let output = String::from_utf8(output).unwrap();
        let lines = output.lines().collect::<Vec<_>>();

        assert!(lines[0].ends_with("region_coordinates\tgenes"));
        assert!(lines[1].ends_with("\tGENE_A,GENE_B,GENE_C"));
        assert!(lines[2].ends_with("\tGENE_C"));
    }

    #[test]
    fn test_write_seg_track() {
        let (cohort, call_result) = get_called_test_cohort();
        let mut output = Vec::new();
        write_seg_track(&mut output, &cohort, &call_result, 1);
        let output = String::from_utf8(output).unwrap();
        let lines = output.lines().collect::<Vec<_>>();

        assert_eq!(lines.len(), 9);
        assert_eq!(lines[0], "#type=GENE_EXPRESSION");
        assert!(lines[1].contains("name=\"s1 CN z-score\""));
        assert_eq!(lines[2], "ID\tchr\tstart\tend\tlog2-ratio\tcopy-number\tz-score");
        assert_eq!(lines[3], "\tchr1\t0\t100\t0.00\t2\t0.00");
        assert_eq!(lines[6], "\tchr2\t4000\t4100\t-1.00\t1\t-5.00");
        assert_eq!(lines[8], "\tchr1\t3000\t3100\tQC failed\tQC failed\t0.0");
    }
}
