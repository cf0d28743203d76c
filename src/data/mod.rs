mod fix_reader;
mod report;

pub use {
    fix_reader::{
        CSV_TIME_FORMAT, GEOLIFE_UTC_OFFSET_SECS, geolife_offset, list_geolife_users,
        parse_timestamp, read_csv_fixes, read_geolife_user, read_plt_file,
    },
    report::{
        BatchReporter, ProfileRow, label_counts, render_profile_table, render_user_report,
        write_report_json,
    },
};
