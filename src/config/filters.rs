//! Search refinements
//!
//! Every band maps a kebab-case slug (as written in the configuration file)
//! to the numeric code the listing source expects. `Unrestricted` is code `0`
//! and never appears in a query string or a dataset name.

use crate::ConfigError;
use serde::Deserialize;
use std::fmt;

/// Region code meaning "nationwide"
pub const NATIONWIDE: u32 = 100_010_000;

/// Known cities and their region codes
const CITY_CODES: &[(&str, u32)] = &[
    ("nationwide", NATIONWIDE),
    ("beijing", 101_010_100),
    ("shanghai", 101_020_100),
    ("guangzhou", 101_280_100),
    ("shenzhen", 101_280_600),
    ("hangzhou", 101_210_100),
    ("wuhan", 101_200_100),
    ("chengdu", 101_270_100),
    ("nanjing", 101_190_100),
    ("xian", 101_110_100),
    ("tianjin", 101_030_100),
    ("suzhou", 101_190_400),
    ("changsha", 101_250_100),
    ("chongqing", 101_040_100),
    ("zhengzhou", 101_180_100),
    ("qingdao", 101_120_200),
    ("hefei", 101_220_100),
    ("fuzhou", 101_230_100),
    ("jinan", 101_120_100),
    ("dalian", 101_070_200),
    ("zhuhai", 101_280_700),
    ("xiamen", 101_230_200),
    ("kunming", 101_290_100),
    ("ningbo", 101_210_400),
    ("dongguan", 101_281_600),
    ("foshan", 101_280_800),
    ("nanchang", 101_240_100),
    ("shenyang", 101_070_100),
    ("shijiazhuang", 101_090_100),
    ("harbin", 101_050_100),
    ("nantong", 101_190_500),
    ("guiyang", 101_260_100),
    ("wuxi", 101_190_200),
    ("quanzhou", 101_230_500),
    ("wenzhou", 101_210_700),
    ("jinhua", 101_210_900),
    ("yantai", 101_120_500),
    ("huizhou", 101_280_300),
    ("urumqi", 101_130_100),
    ("xuzhou", 101_190_800),
    ("jiaxing", 101_210_300),
    ("taiyuan", 101_100_100),
    ("baoding", 101_090_200),
    ("lanzhou", 101_160_100),
    ("hohhot", 101_080_100),
    ("changzhou", 101_191_100),
    ("shaoxing", 101_210_500),
    ("zhongshan", 101_281_700),
    ("taizhou", 101_210_600),
    ("changchun", 101_060_100),
    ("weifang", 101_120_600),
    ("yangzhou", 101_190_600),
    ("luoyang", 101_180_900),
    ("weihai", 101_121_300),
    ("tangshan", 101_090_500),
    ("zhenjiang", 101_190_300),
];

/// Declares a filter band enum with its query parameter and file tag
macro_rules! filter_band {
    (
        $(#[$meta:meta])*
        $name:ident, param = $param:literal, tag = $tag:literal,
        { $($variant:ident => ($slug:literal, $code:literal)),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
        pub enum $name {
            #[default]
            #[serde(rename = "unrestricted")]
            Unrestricted,
            $(
                #[serde(rename = $slug)]
                $variant,
            )+
        }

        impl $name {
            /// Query parameter carrying this band
            pub const PARAM: &'static str = $param;

            /// Prefix used in dataset names
            pub const TAG: &'static str = $tag;

            /// Numeric code understood by the listing source
            pub fn code(self) -> u32 {
                match self {
                    Self::Unrestricted => 0,
                    $(Self::$variant => $code,)+
                }
            }

            /// Configuration slug
            pub fn slug(self) -> &'static str {
                match self {
                    Self::Unrestricted => "unrestricted",
                    $(Self::$variant => $slug,)+
                }
            }

            pub fn is_unrestricted(self) -> bool {
                self == Self::Unrestricted
            }

            fn param(self) -> Option<(&'static str, String)> {
                (!self.is_unrestricted()).then(|| (Self::PARAM, self.code().to_string()))
            }

            fn tag(self) -> Option<String> {
                (!self.is_unrestricted()).then(|| format!("{}-{}", Self::TAG, self.code()))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.slug())
            }
        }
    };
}

filter_band!(
    /// Monthly salary band
    SalaryBand, param = "salary", tag = "salary",
    {
        Below3k => ("below-3k", 1),
        From3kTo5k => ("3-5k", 2),
        From5kTo10k => ("5-10k", 3),
        From10kTo15k => ("10-15k", 4),
        From15kTo20k => ("15-20k", 5),
        From20kTo30k => ("20-30k", 6),
        From30kTo50k => ("30-50k", 7),
        Above50k => ("above-50k", 8),
    }
);

filter_band!(
    /// Required working experience
    ExperienceBand, param = "experience", tag = "experience",
    {
        Student => ("student", 108),
        NewGraduate => ("new-graduate", 109),
        UnderOneYear => ("under-1-year", 101),
        OneToThreeYears => ("1-3-years", 102),
        ThreeToFiveYears => ("3-5-years", 103),
        FiveToTenYears => ("5-10-years", 104),
        OverTenYears => ("over-10-years", 105),
    }
);

filter_band!(
    /// Minimum education
    EducationBand, param = "education", tag = "education",
    {
        JuniorHigh => ("junior-high", 209),
        Vocational => ("vocational", 208),
        HighSchool => ("high-school", 206),
        Associate => ("associate", 202),
        Bachelor => ("bachelor", 203),
        Master => ("master", 204),
        Doctorate => ("doctorate", 205),
    }
);

filter_band!(
    /// Employment type
    JobType, param = "jobType", tag = "type",
    {
        FullTime => ("full-time", 1),
        PartTime => ("part-time", 2),
        Internship => ("internship", 3),
    }
);

filter_band!(
    /// Company headcount
    CompanySize, param = "scale", tag = "scale",
    {
        Under15 => ("under-15", 301),
        From15To50 => ("15-50", 302),
        From50To150 => ("50-150", 303),
        From150To500 => ("150-500", 304),
        From500To2000 => ("500-2000", 305),
        Over2000 => ("over-2000", 306),
    }
);

filter_band!(
    /// Company funding stage
    FundingStage, param = "stage", tag = "stage",
    {
        Unfunded => ("unfunded", 801),
        Angel => ("angel", 802),
        SeriesA => ("series-a", 803),
        SeriesB => ("series-b", 804),
        SeriesC => ("series-c", 805),
        SeriesDPlus => ("series-d-plus", 806),
        Listed => ("listed", 807),
        NotNeeded => ("not-needed", 808),
    }
);

filter_band!(
    /// Position category
    PositionCategory, param = "position", tag = "position",
    {
        Technology => ("technology", 100_000),
        Product => ("product", 100_001),
        Design => ("design", 100_002),
        Operations => ("operations", 100_003),
        Marketing => ("marketing", 100_004),
        Sales => ("sales", 100_005),
        Administration => ("administration", 100_006),
        Finance => ("finance", 100_007),
        Education => ("education", 100_008),
        Healthcare => ("healthcare", 100_009),
        Other => ("other", 100_010),
    }
);

filter_band!(
    /// How recently a listing was published
    Recency, param = "publishTime", tag = "published",
    {
        Day => ("24h", 1),
        ThreeDays => ("3d", 3),
        Week => ("7d", 7),
        Month => ("30d", 30),
    }
);

/// Search region, either nationwide or a city code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "RegionSpec")]
pub struct Region(u32);

/// Regions may be written as a city name or as a raw code
#[derive(Deserialize)]
#[serde(untagged)]
enum RegionSpec {
    Code(u32),
    Name(String),
}

impl TryFrom<RegionSpec> for Region {
    type Error = ConfigError;

    fn try_from(spec: RegionSpec) -> Result<Self, Self::Error> {
        match spec {
            RegionSpec::Code(code) => Region::from_code(code),
            RegionSpec::Name(name) => name.parse(),
        }
    }
}

impl Region {
    pub const NATIONWIDE: Region = Region(NATIONWIDE);

    /// Accepts any nine-digit region code
    pub fn from_code(code: u32) -> Result<Self, ConfigError> {
        if (100_000_000..=999_999_999).contains(&code) {
            Ok(Region(code))
        } else {
            Err(ConfigError::UnknownRegion(code.to_string()))
        }
    }

    pub fn code(self) -> u32 {
        self.0
    }

    pub fn is_nationwide(self) -> bool {
        self.0 == NATIONWIDE
    }

    /// City name for known codes
    pub fn name(self) -> Option<&'static str> {
        CITY_CODES
            .iter()
            .find(|(_, code)| *code == self.0)
            .map(|(name, _)| *name)
    }
}

impl Default for Region {
    fn default() -> Self {
        Region::NATIONWIDE
    }
}

impl std::str::FromStr for Region {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(code) = trimmed.parse::<u32>() {
            return Region::from_code(code);
        }

        let wanted = trimmed.to_lowercase();
        CITY_CODES
            .iter()
            .find(|(name, _)| *name == wanted)
            .map(|(_, code)| Region(*code))
            .ok_or_else(|| ConfigError::UnknownRegion(s.to_string()))
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{} ({})", name, self.0),
            None => write!(f, "{}", self.0),
        }
    }
}

/// Immutable set of search refinements for one session
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FilterCriteria {
    #[serde(rename = "city")]
    pub region: Region,
    pub salary: SalaryBand,
    pub experience: ExperienceBand,
    pub education: EducationBand,
    #[serde(rename = "job-type")]
    pub job_type: JobType,
    #[serde(rename = "company-size")]
    pub company_size: CompanySize,
    #[serde(rename = "funding-stage")]
    pub funding_stage: FundingStage,
    pub position: PositionCategory,
    pub recency: Recency,
    /// Sort by publication time instead of relevance
    pub latest: bool,
}

impl FilterCriteria {
    /// Query parameters contributed by these filters, in a stable order
    ///
    /// The region is always sent, even when nationwide.
    pub fn query_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("city", self.region.code().to_string())];
        params.extend(
            [
                self.salary.param(),
                self.experience.param(),
                self.education.param(),
                self.job_type.param(),
                self.company_size.param(),
                self.funding_stage.param(),
                self.position.param(),
                self.recency.param(),
            ]
            .into_iter()
            .flatten(),
        );
        if self.latest {
            params.push(("sortType", "1".to_string()));
        }
        params
    }

    /// Tags identifying non-default filters in a dataset name
    pub fn file_tags(&self) -> Vec<String> {
        let mut tags = Vec::new();
        if !self.region.is_nationwide() {
            tags.push(format!("city-{}", self.region.code()));
        }
        tags.extend(
            [
                self.salary.tag(),
                self.experience.tag(),
                self.education.tag(),
                self.job_type.tag(),
                self.company_size.tag(),
                self.funding_stage.tag(),
                self.position.tag(),
                self.recency.tag(),
            ]
            .into_iter()
            .flatten(),
        );
        if self.latest {
            tags.push("latest".to_string());
        }
        tags
    }
}
